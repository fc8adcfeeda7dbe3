//! Regel temporal rule engine -- composes versioned pure rules into a
//! graph, partitions a query period at every breakpoint, evaluates the
//! graph once per sub-period and returns each value with a full
//! explanation tree.
//!
//! Typical use:
//! 1. Build a domain-specific grunnlag from [`Fact`]s and
//!    [`PeriodVarying`] values.
//! 2. Build a [`Rule`] from leaves ([`Rule::constant`], [`Rule::extract`],
//!    [`Rule::extract_at`]) and combinators ([`Rule::combine2`],
//!    [`Rule::multiply`], [`Rule::latest_valid_variant`], ...).
//! 3. Call [`run`] (or [`run_periodized`]) with a [`RegelPeriode`].
//!
//! The engine does no I/O, holds no state between runs and never
//! serializes; callers map [`RuleRunResult`] into their own DTOs.

pub mod engine;
pub mod error;
pub mod fact;
pub mod numeric;
pub mod period;
pub mod provenance;
pub mod rule;
pub mod temporal;
pub mod varying;
pub mod version;

#[cfg(feature = "parallel")]
pub use engine::run_parallel;
pub use engine::{
    run, run_periodized, InvalidForPeriod, OffendingRule, PeriodResult, RuleRunResult,
};
pub use error::{
    ArithmeticOverflow, DefinitionError, EvalError, FailureReason, NoValidRuleForDate, PeriodError,
};
pub use fact::Fact;
pub use numeric::Rounding;
pub use period::RegelPeriode;
pub use provenance::{EvaluatedValue, FactNode, Node, RuleNode};
pub use rule::{EvalContext, Rule, RuleGraph, RuleKind, RuleMeta, RuleReference, RuleValue};
pub use temporal::{applied_rules, breakpoints};
pub use varying::{PeriodVarying, Schedule};
pub use version::EngineVersion;

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
