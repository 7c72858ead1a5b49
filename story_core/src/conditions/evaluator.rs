use std::cell::RefCell;

use tracing::trace;

use story_schema::condition::{BoolExpr, Comparison, DotPath, Operand};
use story_schema::BoolExprDefinition;

use super::PropertyValue;
use crate::entity::{Entity, EntityRef, RawProperty};
use crate::error::{ConditionError, ExpressionEvalError, StateAccessError};
use crate::project::Project;

/// Evaluates condition expressions against a project.
///
/// Evaluation is lazy: a broken reference only fails when the branch holding it is
/// actually evaluated. Conditions stored on entities (such as `enabled`) are evaluated
/// when a dot path reaches them; the evaluator keeps the chain of conditions in
/// progress to report cycles.
pub struct BoolExprEvaluator<'p> {
    project: &'p Project,
    in_progress: RefCell<Vec<String>>,
}

impl<'p> BoolExprEvaluator<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self {
            project,
            in_progress: RefCell::new(Vec::new()),
        }
    }

    /// Evaluate an expression to a boolean.
    ///
    /// `and` / `or` short-circuit left to right.
    pub fn eval(&self, expr: &BoolExpr) -> Result<bool, ConditionError> {
        let result = match expr {
            BoolExpr::Literal(literal) => literal.is_truthy(),
            BoolExpr::Path(path) => self.resolve_dot_path(path)?.is_truthy(),
            BoolExpr::Comparison(comparison) => self.eval_comparison(comparison)?,
            BoolExpr::Not(inner) => !self.eval(inner)?,
            BoolExpr::And(left, right) => self.eval(left)? && self.eval(right)?,
            BoolExpr::Or(left, right) => self.eval(left)? || self.eval(right)?,
        };
        trace!(%expr, result, "Evaluated condition");
        Ok(result)
    }

    /// Evaluate a definition: every expression must hold.
    pub fn eval_definition(&self, definition: &BoolExprDefinition) -> Result<bool, ConditionError> {
        for expr in definition.exprs() {
            if !self.eval(expr)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether `entity` is enabled under its `enabled` condition.
    pub fn entity_enabled(
        &self,
        entity: &Entity,
        enabled: &BoolExprDefinition,
    ) -> Result<bool, ConditionError> {
        self.eval_stored_condition(format!("{}.enabled", entity.id()), enabled)
    }

    /// Evaluate a condition stored on an entity property, tracking it as in progress.
    fn eval_stored_condition(
        &self,
        key: String,
        definition: &BoolExprDefinition,
    ) -> Result<bool, ConditionError> {
        let config = self.project.config();
        {
            let mut in_progress = self.in_progress.borrow_mut();
            if config.detect_condition_cycles {
                if let Some(start) = in_progress.iter().position(|k| *k == key) {
                    let mut chain = in_progress[start..].to_vec();
                    chain.push(key);
                    return Err(ExpressionEvalError::CircularCondition { chain }.into());
                }
            }
            if in_progress.len() >= config.max_condition_depth {
                return Err(ExpressionEvalError::DepthExceeded {
                    limit: config.max_condition_depth,
                    condition: key,
                }
                .into());
            }
            in_progress.push(key);
        }

        let result = self.eval_definition(definition);
        self.in_progress.borrow_mut().pop();
        result
    }

    fn eval_comparison(&self, comparison: &Comparison) -> Result<bool, ConditionError> {
        let left = self.resolve_operand(&comparison.left)?;
        let right = self.resolve_operand(&comparison.right)?;
        Ok(left.compare(comparison.op, &right)?)
    }

    fn resolve_operand<'a>(&'a self, operand: &'a Operand) -> Result<PropertyValue<'a>, ConditionError> {
        match operand {
            Operand::Literal(literal) => Ok(PropertyValue::from_literal(literal)),
            Operand::Path(path) => self.resolve_dot_path(path),
        }
    }

    /// Resolve `entity_id.prop.prop...` to a value.
    ///
    /// Every property but the last must resolve to an entity.
    pub fn resolve_dot_path(&self, path: &DotPath) -> Result<PropertyValue<'p>, ConditionError> {
        let mut entity = self.resolve_entity(path.entity_id.as_str())?;
        let Some((last, init)) = path.property_chain.split_last() else {
            return Ok(PropertyValue::Entity(entity));
        };

        for property in init {
            match self.resolve_entity_property(entity, property.as_str())? {
                PropertyValue::Entity(next) => entity = next,
                _ => {
                    return Err(ExpressionEvalError::NotAnEntity {
                        property: property.to_string(),
                        entity_id: entity.id().to_string(),
                    }
                    .into())
                }
            }
        }
        self.resolve_entity_property(entity, last.as_str())
    }

    /// Look up an entity by id across the whole project.
    pub fn resolve_entity(&self, entity_id: &str) -> Result<&'p Entity, ExpressionEvalError> {
        self.project
            .get_entity(entity_id)
            .map_err(|source| ExpressionEvalError::InvalidEntityId {
                entity_id: entity_id.to_string(),
                source,
            })
    }

    /// Resolve one property of `entity`. Stored conditions are evaluated.
    pub fn resolve_entity_property(
        &self,
        entity: &'p Entity,
        property: &str,
    ) -> Result<PropertyValue<'p>, ConditionError> {
        let raw = entity
            .property(property)
            .ok_or_else(|| ExpressionEvalError::PropertyNotFound {
                property: property.to_string(),
                entity_id: entity.id().to_string(),
            })?;

        let value = match raw {
            RawProperty::Str(s) => PropertyValue::Str(s),
            RawProperty::StrList(items) => PropertyValue::Strs(items),
            RawProperty::Condition(definition) => PropertyValue::Bool(
                self.eval_stored_condition(format!("{}.{property}", entity.id()), definition)?,
            ),
            RawProperty::Entity(entity_ref) => PropertyValue::Entity(self.dereference(entity_ref)?),
            RawProperty::Entities(refs) => PropertyValue::Entities(
                refs.iter()
                    .map(|entity_ref| self.dereference(entity_ref))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(value)
    }

    fn dereference(&self, entity_ref: &EntityRef) -> Result<&'p Entity, ExpressionEvalError> {
        self.project
            .entity(entity_ref)
            .ok_or_else(|| ExpressionEvalError::InvalidEntityId {
                entity_id: entity_ref.entity_id.clone(),
                source: StateAccessError::EntityNotFound(entity_ref.entity_id.clone()),
            })
    }
}
