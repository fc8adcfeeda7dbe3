use time::Date;

use crate::rule::{RuleMeta, RuleReference};

/// A malformed rule graph, detected while the rule is being defined.
///
/// These are programming errors in a rule library. They surface when the
/// library is built (typically at startup or in its tests), never per
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// A latest-valid-variant rule was given no candidates.
    #[error("rule {reference} has no candidate variants")]
    EmptyCandidates { reference: RuleReference },

    /// Two candidates of one latest-valid-variant rule share a validFrom date.
    #[error("rule {reference} has more than one candidate valid from {valid_from}")]
    DuplicateValidFrom {
        reference: RuleReference,
        valid_from: Date,
    },

    /// An n-ary combinator was given fewer operands than it needs.
    #[error("rule {reference} needs at least {required} operands, got {actual}")]
    TooFewOperands {
        reference: RuleReference,
        required: usize,
        actual: usize,
    },
}

/// An invalid [`RegelPeriode`](crate::period::RegelPeriode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("empty period: {to} is not after {from}")]
    Empty { from: Date, to: Date },
}

/// No candidate of a latest-valid-variant rule is valid on `date`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no variant of rule {} is valid on {date}", .rule.reference)]
pub struct NoValidRuleForDate {
    pub date: Date,
    pub rule: RuleMeta,
}

/// Decimal arithmetic inside a rule left the representable range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("arithmetic overflow in rule {} on {date}", .rule.reference)]
pub struct ArithmeticOverflow {
    pub date: Date,
    pub rule: RuleMeta,
}

/// Why a sub-period could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    NoValidVariant,
    Overflow,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NoValidVariant => "no_valid_variant",
            FailureReason::Overflow => "overflow",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation failure of a well-formed rule graph on one anchor date.
///
/// Propagated unchanged through every enclosing rule and caught once per
/// sub-period by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    NoValidRule(#[from] NoValidRuleForDate),

    #[error(transparent)]
    Overflow(#[from] ArithmeticOverflow),
}

impl EvalError {
    /// The rule that failed.
    pub fn rule(&self) -> &RuleMeta {
        match self {
            EvalError::NoValidRule(e) => &e.rule,
            EvalError::Overflow(e) => &e.rule,
        }
    }

    pub fn date(&self) -> Date {
        match self {
            EvalError::NoValidRule(e) => e.date,
            EvalError::Overflow(e) => e.date,
        }
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            EvalError::NoValidRule(_) => FailureReason::NoValidVariant,
            EvalError::Overflow(_) => FailureReason::Overflow,
        }
    }

    pub(crate) fn into_parts(self) -> (RuleMeta, FailureReason) {
        let reason = self.reason();
        match self {
            EvalError::NoValidRule(e) => (e.rule, reason),
            EvalError::Overflow(e) => (e.rule, reason),
        }
    }
}
