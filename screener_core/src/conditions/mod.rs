//! The condition catalog and the evaluator that folds toggled conditions
//! into a per-ticker verdict.

pub mod catalog;
pub mod evaluator;
pub mod predicate;

pub use catalog::{CATALOG, Condition, ConditionId, condition};
pub use evaluator::{Evaluation, Selection, SelectionError, evaluate, evaluate_verdict};
pub use predicate::{EvalContext, InversePolicy, Predicate, PredicateOutcome};
