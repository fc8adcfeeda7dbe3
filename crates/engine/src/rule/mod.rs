//! Rules: named, versioned pure functions from a grunnlag to a value.
//!
//! A [`Rule`] is a cheap, shareable handle to an immutable rule node.
//! Nodes come in a fixed set of kinds (see [`RuleKind`]): leaves that read
//! constants or facts, combinators over 1..N child rules, and the
//! latest-valid-variant selector in [`crate::temporal`]. Composition
//! always builds a new node that holds its children directly, so a rule
//! graph is acyclic by construction.

pub mod combine;
pub mod leaf;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use time::Date;

use crate::error::EvalError;
use crate::provenance::EvaluatedValue;

/// Stable identifier plus version label of a rule, for audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleReference {
    pub id: String,
    pub version: String,
}

impl RuleReference {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        RuleReference {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for RuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// Metadata shared by every rule kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleMeta {
    /// The date from which this rule variant is the legally applicable one.
    pub valid_from: Date,
    pub description: String,
    pub reference: RuleReference,
}

impl RuleMeta {
    pub fn new(valid_from: Date, description: impl Into<String>, reference: RuleReference) -> Self {
        RuleMeta {
            valid_from,
            description: description.into(),
            reference,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Constant,
    Extract,
    ExtractAt,
    Combine,
    Multiply,
    LatestValidVariant,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Constant => "constant",
            RuleKind::Extract => "extract",
            RuleKind::ExtractAt => "extract_at",
            RuleKind::Combine => "combine",
            RuleKind::Multiply => "multiply",
            RuleKind::LatestValidVariant => "latest_valid_variant",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bound for every value a rule can produce.
///
/// `Debug` is used to render values into the provenance tree.
pub trait RuleValue: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> RuleValue for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// Per-evaluation context handed down the rule graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    anchor: Date,
}

impl EvalContext {
    pub fn new(anchor: Date) -> Self {
        EvalContext { anchor }
    }

    /// The date used for every variant selection and period-varying
    /// projection in this evaluation.
    pub fn anchor(&self) -> Date {
        self.anchor
    }
}

/// Type-erased structural view of a rule node.
///
/// Used for walks that only need metadata and shape: breakpoint
/// discovery, rule inventories and the engine version digest.
pub trait RuleGraph: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    fn kind(&self) -> RuleKind;

    /// Direct children, in declaration order. For a latest-valid-variant
    /// rule these are its candidates.
    fn children(&self) -> Vec<&dyn RuleGraph>;
}

pub(crate) trait Evaluate<G, T>: Send + Sync {
    fn graph(&self) -> &dyn RuleGraph;

    fn evaluate(&self, grunnlag: &G, ctx: &EvalContext)
        -> Result<EvaluatedValue<T>, EvalError>;

    /// Dates at which data read from `grunnlag` by this subtree changes.
    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>);
}

/// A versioned pure function `G -> T` with provenance.
///
/// Cloning is cheap and shares the underlying node.
pub struct Rule<G, T> {
    node: Arc<dyn Evaluate<G, T>>,
}

impl<G, T> Clone for Rule<G, T> {
    fn clone(&self) -> Self {
        Rule {
            node: Arc::clone(&self.node),
        }
    }
}

impl<G, T> fmt::Debug for Rule<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind())
            .field("reference", &self.meta().reference)
            .field("valid_from", &self.meta().valid_from)
            .finish()
    }
}

impl<G, T> Rule<G, T> {
    pub(crate) fn from_node(node: impl Evaluate<G, T> + 'static) -> Self {
        Rule {
            node: Arc::new(node),
        }
    }

    pub fn meta(&self) -> &RuleMeta {
        self.node.graph().meta()
    }

    pub fn kind(&self) -> RuleKind {
        self.node.graph().kind()
    }

    pub fn valid_from(&self) -> Date {
        self.meta().valid_from
    }

    pub fn reference(&self) -> &RuleReference {
        &self.meta().reference
    }

    pub fn graph(&self) -> &dyn RuleGraph {
        self.node.graph()
    }

    /// Evaluate against `grunnlag` with `ctx.anchor()` as the anchor date.
    pub fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        self.node.evaluate(grunnlag, ctx)
    }

    pub fn evaluate_at(
        &self,
        grunnlag: &G,
        anchor: Date,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        self.evaluate(grunnlag, &EvalContext::new(anchor))
    }

    /// Breakpoints contributed by the data this rule reads from
    /// `grunnlag`, as opposed to the structural ones of
    /// [`crate::temporal::breakpoints`].
    pub fn data_breakpoints(&self, grunnlag: &G) -> BTreeSet<Date> {
        let mut out = BTreeSet::new();
        self.node.data_breakpoints(grunnlag, &mut out);
        out
    }

    pub(crate) fn collect_data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        self.node.data_breakpoints(grunnlag, out);
    }
}
