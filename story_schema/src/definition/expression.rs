//! Author-facing boolean conditions.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::validation::kind_of;
use crate::condition::{parse, BoolExpr, Literal};

/// A dynamic boolean condition, such as an entity's `enabled` flag.
///
/// Accepted forms:
/// - a boolean or number literal (`true`, `0`)
/// - a single expression string (`"foo.a or not bar.b"`)
/// - a list of the above, combined with logical AND (`["foo.a", "bar.b"]`)
/// - any of the above wrapped as `{ "value": ... }`
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExprDefinition {
    Single(BoolExpr),
    /// Every expression must hold. An empty list holds.
    All(Vec<BoolExpr>),
}

impl Default for BoolExprDefinition {
    fn default() -> Self {
        BoolExprDefinition::Single(BoolExpr::Literal(Literal::Bool(true)))
    }
}

impl BoolExprDefinition {
    /// Read a condition from plain data.
    ///
    /// The error is a user-facing message; syntax errors are rendered with
    /// [`crate::SyntaxError::explain`].
    pub fn from_value(data: &Value) -> Result<Self, String> {
        match data {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) | Value::Null => {
                        Err(format!("Unsupported type in list: {}", kind_of(item)))
                    }
                    scalar => expr_from_scalar(scalar),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(BoolExprDefinition::All),
            Value::Object(map) => match (map.get("value"), map.len()) {
                (Some(inner), 1) => Self::from_value(inner),
                _ => Err(
                    "Expected a boolean, number, string, list or a mapping with a single 'value' key"
                        .to_string(),
                ),
            },
            Value::Null => Err("Expected a condition, got null".to_string()),
            scalar => expr_from_scalar(scalar).map(BoolExprDefinition::Single),
        }
    }

    /// The expressions in evaluation order.
    pub fn exprs(&self) -> &[BoolExpr] {
        match self {
            BoolExprDefinition::Single(expr) => std::slice::from_ref(expr),
            BoolExprDefinition::All(exprs) => exprs,
        }
    }

    /// A condition that always holds or never holds.
    pub fn constant(value: bool) -> Self {
        BoolExprDefinition::Single(BoolExpr::Literal(Literal::Bool(value)))
    }
}

fn expr_from_scalar(value: &Value) -> Result<BoolExpr, String> {
    match value {
        Value::Bool(b) => Ok(BoolExpr::Literal(Literal::Bool(*b))),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(BoolExpr::Literal(Literal::Int(i))),
            (None, Some(x)) => Ok(BoolExpr::Literal(Literal::Float(x))),
            (None, None) => Err(format!("Unsupported number: {n}")),
        },
        Value::String(text) => parse(text).map_err(|err| err.explain()),
        other => Err(format!("Unsupported condition type: {}", kind_of(other))),
    }
}

impl FromStr for BoolExprDefinition {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse(text)
            .map(BoolExprDefinition::Single)
            .map_err(|err| err.explain())
    }
}

impl From<BoolExpr> for BoolExprDefinition {
    fn from(expr: BoolExpr) -> Self {
        BoolExprDefinition::Single(expr)
    }
}

impl<'de> Deserialize<'de> for BoolExprDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::DotPath;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn enabled(entity_id: &str) -> BoolExpr {
        BoolExpr::Path(DotPath::new(entity_id, ["enabled"]))
    }

    #[test]
    fn test_default_is_true() {
        assert_eq!(BoolExprDefinition::default(), BoolExprDefinition::constant(true));
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(
            BoolExprDefinition::from_value(&json!(false)).unwrap(),
            BoolExprDefinition::constant(false)
        );
    }

    #[test]
    fn test_from_wrapped_value() {
        assert_eq!(
            BoolExprDefinition::from_value(&json!({ "value": true })).unwrap(),
            BoolExprDefinition::constant(true)
        );
        assert!(BoolExprDefinition::from_value(&json!({ "value": true, "other": 1 })).is_err());
    }

    #[test]
    fn test_from_string() {
        assert_eq!(
            BoolExprDefinition::from_value(&json!("node_a.enabled")).unwrap(),
            BoolExprDefinition::Single(enabled("node_a"))
        );
    }

    #[test]
    fn test_from_list() {
        let definition =
            BoolExprDefinition::from_value(&json!(["node_a.enabled", true, 5, 0.5])).unwrap();
        assert_eq!(
            definition,
            BoolExprDefinition::All(vec![
                enabled("node_a"),
                BoolExpr::Literal(Literal::Bool(true)),
                BoolExpr::Literal(Literal::Int(5)),
                BoolExpr::Literal(Literal::Float(0.5)),
            ])
        );
        assert_eq!(definition.exprs().len(), 4);
    }

    #[test]
    fn test_list_rejects_nested_structures() {
        let err = BoolExprDefinition::from_value(&json!(["a.b", ["c.d"]])).unwrap_err();
        assert_eq!(err, "Unsupported type in list: list");
    }

    #[test]
    fn test_syntax_error_is_explained() {
        let err = BoolExprDefinition::from_value(&json!("node_a..enabled")).unwrap_err();
        assert!(err.starts_with("node_a..enabled\n"));
        assert!(err.contains("SyntaxError"));
    }

    #[test]
    fn test_from_str_and_deserialize() {
        let parsed: BoolExprDefinition = "not node_b.enabled".parse().unwrap();
        assert_eq!(
            parsed,
            BoolExprDefinition::Single(BoolExpr::not(enabled("node_b")))
        );

        let deserialized: BoolExprDefinition =
            serde_json::from_value(json!(["node_a.enabled"])).unwrap();
        assert_eq!(deserialized, BoolExprDefinition::All(vec![enabled("node_a")]));
        assert!(serde_json::from_value::<BoolExprDefinition>(json!(null)).is_err());
    }
}
