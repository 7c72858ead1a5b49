use story_schema::BoolExprDefinition;

use super::EntityRef;

/// An entity property as stored, before the evaluator resolves it.
///
/// Conditions are still unevaluated and entity references are still ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawProperty<'e> {
    Str(&'e str),
    StrList(&'e [String]),
    Condition(&'e BoolExprDefinition),
    Entity(&'e EntityRef),
    Entities(&'e [EntityRef]),
}
