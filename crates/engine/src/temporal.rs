//! Temporal resolution: variant selection by date and breakpoint discovery.

use std::collections::{BTreeSet, HashSet};

use time::Date;

use crate::error::{DefinitionError, EvalError, NoValidRuleForDate};
use crate::provenance::EvaluatedValue;
use crate::rule::{EvalContext, Evaluate, Rule, RuleGraph, RuleKind, RuleMeta, RuleReference, RuleValue};

/// Candidates sorted by ascending `valid_from`, all distinct.
struct LatestValidVariant<G, T> {
    meta: RuleMeta,
    candidates: Vec<Rule<G, T>>,
}

impl<G, T> RuleGraph for LatestValidVariant<G, T> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::LatestValidVariant
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        self.candidates.iter().map(Rule::graph).collect()
    }
}

impl<G, T: RuleValue> Evaluate<G, T> for LatestValidVariant<G, T> {
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        let chosen = self
            .candidates
            .iter()
            .rev()
            .find(|c| c.valid_from() <= ctx.anchor())
            .ok_or_else(|| NoValidRuleForDate {
                date: ctx.anchor(),
                rule: self.meta.clone(),
            })?;
        let result = chosen.evaluate(grunnlag, ctx)?;
        Ok(EvaluatedValue::new(
            result.value.clone(),
            self.meta.clone(),
            RuleKind::LatestValidVariant,
            vec![result.into_node()],
        ))
    }

    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        for candidate in &self.candidates {
            candidate.collect_data_breakpoints(grunnlag, out);
        }
    }
}

impl<G: 'static, T: RuleValue> Rule<G, T> {
    /// Select, per anchor date, the candidate with the latest
    /// `valid_from` on or before that date.
    ///
    /// Evaluating on a date before every candidate fails with
    /// [`NoValidRuleForDate`]. The candidate set must be non-empty and
    /// no two candidates may share a `valid_from`.
    pub fn latest_valid_variant(
        meta: RuleMeta,
        candidates: Vec<Rule<G, T>>,
    ) -> Result<Self, DefinitionError> {
        if candidates.is_empty() {
            return Err(DefinitionError::EmptyCandidates {
                reference: meta.reference,
            });
        }
        let mut candidates = candidates;
        candidates.sort_by_key(Rule::valid_from);
        if let Some(pair) = candidates
            .windows(2)
            .find(|pair| pair[0].valid_from() == pair[1].valid_from())
        {
            return Err(DefinitionError::DuplicateValidFrom {
                valid_from: pair[0].valid_from(),
                reference: meta.reference,
            });
        }
        Ok(Rule::from_node(LatestValidVariant { meta, candidates }))
    }
}

impl<G, T> Rule<G, T> {
    /// Structural breakpoints of this rule graph. See [`breakpoints`].
    pub fn breakpoints(&self) -> BTreeSet<Date> {
        breakpoints(self.graph())
    }
}

/// Every `valid_from` in the rule graph rooted at `rule`.
///
/// A leaf contributes its own date, a combinator its own date plus its
/// children's, and a latest-valid-variant rule its own date plus every
/// candidate's breakpoints. Breakpoints of period-varying input data are
/// not included; see [`Rule::data_breakpoints`].
pub fn breakpoints(rule: &dyn RuleGraph) -> BTreeSet<Date> {
    let mut out = BTreeSet::new();
    collect_breakpoints(rule, &mut out);
    out
}

fn collect_breakpoints(rule: &dyn RuleGraph, out: &mut BTreeSet<Date>) {
    out.insert(rule.meta().valid_from);
    for child in rule.children() {
        collect_breakpoints(child, out);
    }
}

/// Every distinct rule reference in the graph, depth-first, first
/// occurrence wins.
pub fn applied_rules(rule: &dyn RuleGraph) -> Vec<RuleReference> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_references(rule, &mut seen, &mut out);
    out
}

fn collect_references(
    rule: &dyn RuleGraph,
    seen: &mut HashSet<RuleReference>,
    out: &mut Vec<RuleReference>,
) {
    let reference = &rule.meta().reference;
    if seen.insert(reference.clone()) {
        out.push(reference.clone());
    }
    for child in rule.children() {
        collect_references(child, seen, out);
    }
}
