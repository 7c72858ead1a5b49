//! Condition evaluation against a loaded project.

mod evaluator;
mod value;

pub use evaluator::BoolExprEvaluator;
pub use value::PropertyValue;
