//! Iris species classifier backed by a serialized decision tree.

use serde::{Deserialize, Serialize};

use super::{score_batch, Model};
use crate::error::{InferenceError, LoadError};
use crate::handle::Artifacts;
use crate::schema::{Field, FieldKind, Instances, Predictions, Record};

pub const TREE_ARTIFACT: &str = "decision-tree-model.json";

const FEATURE_NAMES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrisFeatures {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl IrisFeatures {
    fn values(&self) -> [f64; 4] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

impl Record for IrisFeatures {
    const FIELDS: &'static [Field] = &[
        Field::required("sepal_length", FieldKind::Number),
        Field::required("sepal_width", FieldKind::Number),
        Field::required("petal_length", FieldKind::Number),
        Field::required("petal_width", FieldKind::Number),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub species: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

#[derive(Debug, Deserialize)]
struct TreeFile {
    feature_names: Vec<String>,
    classes: Vec<String>,
    nodes: Vec<Node>,
}

/// Decision tree over the four iris measurements.
///
/// Split nodes send a sample left when its feature value is `<= threshold`.
/// Children always sit after their parent in `nodes`, so every walk from the
/// root terminates.
#[derive(Debug)]
pub struct IrisClassifier {
    /// Column of [`IrisFeatures::values`] read by each tree feature index.
    columns: Vec<usize>,
    classes: Vec<String>,
    nodes: Vec<Node>,
}

impl IrisClassifier {
    fn from_tree(tree: TreeFile) -> Result<Self, LoadError> {
        let bad = |reason: String| LoadError::incompatible(TREE_ARTIFACT, reason);

        if tree.nodes.is_empty() {
            return Err(LoadError::corrupt(TREE_ARTIFACT, "tree has no nodes"));
        }
        if tree.classes.is_empty() {
            return Err(LoadError::corrupt(TREE_ARTIFACT, "tree has no classes"));
        }

        let columns = tree
            .feature_names
            .iter()
            .map(|name| {
                FEATURE_NAMES
                    .iter()
                    .position(|f| f == name)
                    .ok_or_else(|| bad(format!("unknown feature '{name}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // each measurement exactly once, in any order
        let mut seen = [false; FEATURE_NAMES.len()];
        for &column in &columns {
            if std::mem::replace(&mut seen[column], true) {
                return Err(bad(format!("duplicate feature '{}'", FEATURE_NAMES[column])));
            }
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(bad(format!("missing feature '{}'", FEATURE_NAMES[missing])));
        }

        for (i, node) in tree.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= columns.len() {
                        return Err(bad(format!("node {i} splits on undeclared feature {feature}")));
                    }
                    if !threshold.is_finite() {
                        return Err(LoadError::corrupt(
                            TREE_ARTIFACT,
                            format!("node {i} has a non-finite threshold"),
                        ));
                    }
                    for child in [left, right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(LoadError::corrupt(
                                TREE_ARTIFACT,
                                format!("node {i} has invalid child {child}"),
                            ));
                        }
                    }
                }
                Node::Leaf { class } => {
                    if class >= tree.classes.len() {
                        return Err(LoadError::corrupt(
                            TREE_ARTIFACT,
                            format!("node {i} predicts unknown class {class}"),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            columns,
            classes: tree.classes,
            nodes: tree.nodes,
        })
    }

    fn classify(&self, features: &IrisFeatures) -> &str {
        let values = features.values();
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if values[self.columns[feature]] <= threshold {
                        left
                    } else {
                        right
                    };
                }
                Node::Leaf { class } => return &self.classes[class],
            }
        }
    }

    fn predict(&self, batch: &[IrisFeatures]) -> Vec<Species> {
        batch
            .iter()
            .map(|features| Species {
                species: self.classify(features).to_string(),
            })
            .collect()
    }
}

impl Model for IrisClassifier {
    const KIND: &'static str = "iris";
    const ARTIFACTS: &'static [&'static str] = &[TREE_ARTIFACT];

    type Request = Instances<IrisFeatures>;
    type Response = Predictions<Species>;

    fn load(artifacts: &Artifacts) -> Result<Self, LoadError> {
        let tree: TreeFile = serde_json::from_slice(artifacts.get(TREE_ARTIFACT)?)
            .map_err(|e| LoadError::corrupt(TREE_ARTIFACT, e))?;
        Self::from_tree(tree)
    }

    fn invoke(&self, request: Self::Request) -> Result<Self::Response, InferenceError> {
        score_batch(&request.instances, |batch| Ok(self.predict(batch)))
    }
}
