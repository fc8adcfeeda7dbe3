//! Leaf rules: constants and fact extractors.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use time::Date;

use super::{EvalContext, Evaluate, Rule, RuleGraph, RuleKind, RuleMeta, RuleValue};
use crate::error::EvalError;
use crate::fact::Fact;
use crate::provenance::{EvaluatedValue, Node};
use crate::varying::PeriodVarying;

struct Constant<T> {
    meta: RuleMeta,
    value: T,
}

impl<T: RuleValue> RuleGraph for Constant<T> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Constant
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        Vec::new()
    }
}

impl<G, T: RuleValue> Evaluate<G, T> for Constant<T> {
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(&self, _: &G, _: &EvalContext) -> Result<EvaluatedValue<T>, EvalError> {
        // The rule library itself is the source of a constant.
        let fact = Fact::new(
            self.value.clone(),
            format!("rule:{}", self.meta.reference),
            self.meta.description.clone(),
        );
        Ok(EvaluatedValue::new(
            self.value.clone(),
            self.meta.clone(),
            RuleKind::Constant,
            vec![Node::Fact(fact.to_node())],
        ))
    }

    fn data_breakpoints(&self, _: &G, _: &mut BTreeSet<Date>) {}
}

struct Extract<F> {
    meta: RuleMeta,
    accessor: F,
}

impl<F: Send + Sync> RuleGraph for Extract<F> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Extract
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        Vec::new()
    }
}

impl<G, T, F> Evaluate<G, T> for Extract<F>
where
    T: RuleValue,
    F: Fn(&G) -> &Fact<T> + Send + Sync,
{
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        _: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        let fact = (self.accessor)(grunnlag);
        Ok(EvaluatedValue::new(
            fact.value().clone(),
            self.meta.clone(),
            RuleKind::Extract,
            vec![Node::Fact(fact.to_node())],
        ))
    }

    fn data_breakpoints(&self, _: &G, _: &mut BTreeSet<Date>) {}
}

struct ExtractAt<F, V> {
    meta: RuleMeta,
    accessor: F,
    _varying: PhantomData<fn() -> V>,
}

impl<F: Send + Sync, V> RuleGraph for ExtractAt<F, V> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::ExtractAt
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        Vec::new()
    }
}

impl<G, T, V, F> Evaluate<G, T> for ExtractAt<F, V>
where
    T: RuleValue,
    V: PeriodVarying<Fact<T>>,
    F: Fn(&G) -> &V + Send + Sync,
{
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        let fact = (self.accessor)(grunnlag).at(ctx.anchor());
        let node = Node::Fact(fact.to_node());
        Ok(EvaluatedValue::new(
            fact.into_value(),
            self.meta.clone(),
            RuleKind::ExtractAt,
            vec![node],
        ))
    }

    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        out.extend((self.accessor)(grunnlag).breakpoints());
    }
}

impl<G: 'static, T: RuleValue> Rule<G, T> {
    /// A rule that ignores the grunnlag and always yields `value`.
    ///
    /// Its provenance child is a fact sourced from the rule reference.
    pub fn constant(meta: RuleMeta, value: T) -> Self {
        Rule::from_node(Constant { meta, value })
    }

    /// A rule that copies one fact out of the grunnlag. The fact is the
    /// sole provenance child.
    pub fn extract<F>(meta: RuleMeta, accessor: F) -> Self
    where
        F: Fn(&G) -> &Fact<T> + Send + Sync + 'static,
    {
        Rule::from_node(Extract { meta, accessor })
    }

    /// A rule that projects a period-varying fact at the anchor date.
    ///
    /// The breakpoints of the varying value join the run's partition, so
    /// each sub-period sees exactly one projected fact.
    pub fn extract_at<V, F>(meta: RuleMeta, accessor: F) -> Self
    where
        V: PeriodVarying<Fact<T>> + 'static,
        F: Fn(&G) -> &V + Send + Sync + 'static,
    {
        Rule::from_node(ExtractAt {
            meta,
            accessor,
            _varying: PhantomData,
        })
    }
}
