//! Request and response envelopes.
//!
//! Records declare their fields statically; [`parse`] walks the incoming JSON
//! against that declaration before handing it to serde, so a rejected request
//! always names the field that failed and the type it should have had.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Integer,
    Text,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Number => "a number",
            FieldKind::Integer => "a non-negative integer",
            FieldKind::Text => "a string",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.as_u64().is_some(),
            FieldKind::Text => value.is_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

/// One structured input unit with a fixed field declaration.
pub trait Record: DeserializeOwned + Send + 'static {
    const FIELDS: &'static [Field];
}

/// A whole request body.
pub trait Envelope: Sized + Send + 'static {
    fn from_value(value: Value) -> Result<Self, ValidationError>;
}

/// `{"instances": [record, ...]}`
#[derive(Debug, Clone, PartialEq)]
pub struct Instances<R> {
    pub instances: Vec<R>,
}

/// A single record at the top level of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Single<R>(pub R);

/// `{"predictions": [prediction, ...]}`, index-aligned with [`Instances`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions<P> {
    pub predictions: Vec<P>,
}

const BODY: &str = "body";

fn join(parent: &str, name: &str) -> String {
    if parent == BODY {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn validate_record<R: Record>(value: Value, path: &str) -> Result<R, ValidationError> {
    let object = value.as_object().ok_or_else(|| ValidationError::WrongType {
        field: path.to_string(),
        expected: "an object",
    })?;

    for field in R::FIELDS {
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(ValidationError::Missing {
                    field: join(path, field.name),
                });
            }
            None | Some(Value::Null) => {}
            Some(v) if !field.kind.accepts(v) => {
                return Err(ValidationError::WrongType {
                    field: join(path, field.name),
                    expected: field.kind.expected(),
                });
            }
            Some(_) => {}
        }
    }

    serde_json::from_value(value).map_err(|e| ValidationError::Invalid {
        field: path.to_string(),
        message: e.to_string(),
    })
}

impl<R: Record> Envelope for Instances<R> {
    fn from_value(mut value: Value) -> Result<Self, ValidationError> {
        let object = value.as_object_mut().ok_or_else(|| ValidationError::WrongType {
            field: BODY.to_string(),
            expected: "an object",
        })?;

        let items = match object.remove("instances") {
            None | Some(Value::Null) => {
                return Err(ValidationError::Missing {
                    field: "instances".to_string(),
                });
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "instances".to_string(),
                    expected: "an array",
                });
            }
        };

        let instances = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| validate_record(item, &format!("instances[{i}]")))
            .collect::<Result<Vec<R>, _>>()?;

        Ok(Instances { instances })
    }
}

impl<R: Record> Envelope for Single<R> {
    fn from_value(value: Value) -> Result<Self, ValidationError> {
        validate_record(value, BODY).map(Single)
    }
}

/// Decode a raw request body into the envelope `E`.
pub fn parse<E: Envelope>(raw: &[u8]) -> Result<E, ValidationError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    E::from_value(value)
}

pub fn serialize<T: Serialize>(response: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: f64,
        label: String,
        #[serde(default)]
        weight: Option<u64>,
    }

    impl Record for Point {
        const FIELDS: &'static [Field] = &[
            Field::required("x", FieldKind::Number),
            Field::required("label", FieldKind::Text),
            Field::optional("weight", FieldKind::Integer),
        ];
    }

    #[test]
    fn parses_instances_in_order() {
        let body = br#"{"instances":[{"x":1,"label":"a"},{"x":2.5,"label":"b","weight":3}]}"#;
        let parsed: Instances<Point> = parse(body).unwrap();
        assert_eq!(parsed.instances.len(), 2);
        assert_eq!(parsed.instances[0].label, "a");
        assert_eq!(parsed.instances[1].x, 2.5);
        assert_eq!(parsed.instances[1].weight, Some(3));
    }

    #[test]
    fn empty_instances_is_valid() {
        let parsed: Instances<Point> = parse(br#"{"instances":[]}"#).unwrap();
        assert!(parsed.instances.is_empty());
    }

    #[test]
    fn names_missing_field_with_index() {
        let body = br#"{"instances":[{"x":1,"label":"a"},{"label":"b"}]}"#;
        let err = parse::<Instances<Point>>(body).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Missing {
                field: "instances[1].x".to_string()
            }
        );
    }

    #[test]
    fn names_mistyped_field_and_expected_type() {
        let body = br#"{"instances":[{"x":"one","label":"a"}]}"#;
        let err = parse::<Instances<Point>>(body).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "instances[0].x".to_string(),
                expected: "a number",
            }
        );

        let err = parse::<Single<Point>>(br#"{"x":1,"label":"a","weight":-2}"#).unwrap_err();
        assert_eq!(err.field(), Some("weight"));
    }

    #[test]
    fn null_required_field_counts_as_missing() {
        let err = parse::<Single<Point>>(br#"{"x":null,"label":"a"}"#).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "x".to_string() });
    }

    #[test]
    fn rejects_malformed_envelopes() {
        assert!(matches!(
            parse::<Instances<Point>>(b"{not json"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            parse::<Instances<Point>>(b""),
            Err(ValidationError::Malformed(_))
        ));
        assert_eq!(
            parse::<Instances<Point>>(br#"{"instances":{"x":1}}"#).unwrap_err(),
            ValidationError::WrongType {
                field: "instances".to_string(),
                expected: "an array",
            }
        );
        assert_eq!(
            parse::<Instances<Point>>(br#"[1,2]"#).unwrap_err().field(),
            Some("body")
        );
        assert_eq!(
            parse::<Instances<Point>>(br#"{"instances":[7]}"#).unwrap_err().field(),
            Some("instances[0]")
        );
    }

    #[test]
    fn ignores_unknown_fields() {
        let Single(point) =
            parse::<Single<Point>>(br#"{"x":0,"label":"z","extra":[1,2]}"#).unwrap();
        assert_eq!(point.label, "z");
        assert_eq!(point.weight, None);
    }
}
