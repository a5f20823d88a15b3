//! Dense vector tables in word2vec text layout: a `count dim` header line
//! followed by one row per entry, optionally prefixed with a label.

use crate::error::LoadError;

#[derive(Debug, Clone)]
pub struct VectorTable {
    pub labels: Vec<String>,
    pub dim: usize,
    data: Vec<f32>,
}

impl VectorTable {
    /// Parse `text`. With `labelled`, each row starts with its label.
    pub fn parse(artifact: &str, text: &str, labelled: bool) -> Result<Self, LoadError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| LoadError::corrupt(artifact, "empty file"))?;
        let mut fields = header.split_whitespace();
        let (count, dim) = match (fields.next(), fields.next(), fields.next()) {
            (Some(count), Some(dim), None) => (
                count
                    .parse::<usize>()
                    .map_err(|e| LoadError::corrupt(artifact, format!("bad row count: {e}")))?,
                dim.parse::<usize>()
                    .map_err(|e| LoadError::corrupt(artifact, format!("bad dimension: {e}")))?,
            ),
            _ => return Err(LoadError::corrupt(artifact, "header must be `count dim`")),
        };
        if dim == 0 {
            return Err(LoadError::corrupt(artifact, "dimension must be positive"));
        }

        // every value takes at least two bytes of text, so the header cannot
        // claim more than the artifact could hold
        let declared = count
            .checked_mul(dim)
            .filter(|&n| n <= text.len() / 2)
            .ok_or_else(|| {
                LoadError::corrupt(artifact, format!("header {count}x{dim} exceeds file size"))
            })?;

        let mut labels = Vec::with_capacity(if labelled { count } else { 0 });
        let mut data = Vec::with_capacity(declared);

        for (row, line) in lines.enumerate() {
            let mut fields = line.split_whitespace();
            if labelled {
                // split_whitespace never yields an empty first field on a non-blank line
                if let Some(label) = fields.next() {
                    labels.push(label.to_string());
                }
            }
            let before = data.len();
            for field in fields {
                let v = field.parse::<f32>().map_err(|e| {
                    LoadError::corrupt(artifact, format!("row {}: {e}", row + 1))
                })?;
                if !v.is_finite() {
                    return Err(LoadError::corrupt(
                        artifact,
                        format!("row {}: non-finite value {field}", row + 1),
                    ));
                }
                data.push(v);
            }
            if data.len() - before != dim {
                return Err(LoadError::corrupt(
                    artifact,
                    format!("row {} has {} values, expected {dim}", row + 1, data.len() - before),
                ));
            }
        }

        let rows = data.len() / dim;
        if rows != count {
            return Err(LoadError::corrupt(
                artifact,
                format!("header declares {count} rows, found {rows}"),
            ));
        }

        Ok(Self { labels, dim, data })
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        self.data.get(i * self.dim..(i + 1) * self.dim)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }

    /// Scale every row to unit length. Zero rows stay zero.
    pub fn normalize(&mut self) {
        for row in self.data.chunks_exact_mut(self.dim) {
            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|v| *v /= norm);
            }
        }
    }
}
