//! Combinator rules: apply a pure function to the values of 1..N child rules.
//!
//! Every combinator evaluates its children against the same grunnlag and
//! anchor date and keeps their full [`EvaluatedValue`]s as provenance
//! children, so the explanation tree reaches all the way down to facts.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use time::Date;

use super::{EvalContext, Evaluate, Rule, RuleGraph, RuleKind, RuleMeta, RuleValue};
use crate::error::{ArithmeticOverflow, DefinitionError, EvalError};
use crate::numeric;
use crate::provenance::EvaluatedValue;

struct Combine1<G, A, F> {
    meta: RuleMeta,
    a: Rule<G, A>,
    f: F,
}

struct Combine2<G, A, B, F> {
    meta: RuleMeta,
    a: Rule<G, A>,
    b: Rule<G, B>,
    f: F,
}

struct Combine3<G, A, B, C, F> {
    meta: RuleMeta,
    a: Rule<G, A>,
    b: Rule<G, B>,
    c: Rule<G, C>,
    f: F,
}

struct Multiply<G> {
    meta: RuleMeta,
    factors: Vec<Rule<G, Decimal>>,
}

impl<G, A, F: Send + Sync> RuleGraph for Combine1<G, A, F> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Combine
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        vec![self.a.graph()]
    }
}

impl<G, A, B, F: Send + Sync> RuleGraph for Combine2<G, A, B, F> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Combine
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        vec![self.a.graph(), self.b.graph()]
    }
}

impl<G, A, B, C, F: Send + Sync> RuleGraph for Combine3<G, A, B, C, F> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Combine
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        vec![self.a.graph(), self.b.graph(), self.c.graph()]
    }
}

impl<G> RuleGraph for Multiply<G> {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Multiply
    }

    fn children(&self) -> Vec<&dyn RuleGraph> {
        self.factors.iter().map(Rule::graph).collect()
    }
}

impl<G, A, T, F> Evaluate<G, T> for Combine1<G, A, F>
where
    A: RuleValue,
    T: RuleValue,
    F: Fn(&A) -> T + Send + Sync,
{
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        let a = self.a.evaluate(grunnlag, ctx)?;
        let value = (self.f)(&a.value);
        Ok(EvaluatedValue::new(
            value,
            self.meta.clone(),
            RuleKind::Combine,
            vec![a.into_node()],
        ))
    }

    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        self.a.collect_data_breakpoints(grunnlag, out);
    }
}

impl<G, A, B, T, F> Evaluate<G, T> for Combine2<G, A, B, F>
where
    A: RuleValue,
    B: RuleValue,
    T: RuleValue,
    F: Fn(&A, &B) -> T + Send + Sync,
{
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        let a = self.a.evaluate(grunnlag, ctx)?;
        let b = self.b.evaluate(grunnlag, ctx)?;
        let value = (self.f)(&a.value, &b.value);
        Ok(EvaluatedValue::new(
            value,
            self.meta.clone(),
            RuleKind::Combine,
            vec![a.into_node(), b.into_node()],
        ))
    }

    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        self.a.collect_data_breakpoints(grunnlag, out);
        self.b.collect_data_breakpoints(grunnlag, out);
    }
}

impl<G, A, B, C, T, F> Evaluate<G, T> for Combine3<G, A, B, C, F>
where
    A: RuleValue,
    B: RuleValue,
    C: RuleValue,
    T: RuleValue,
    F: Fn(&A, &B, &C) -> T + Send + Sync,
{
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<T>, EvalError> {
        let a = self.a.evaluate(grunnlag, ctx)?;
        let b = self.b.evaluate(grunnlag, ctx)?;
        let c = self.c.evaluate(grunnlag, ctx)?;
        let value = (self.f)(&a.value, &b.value, &c.value);
        Ok(EvaluatedValue::new(
            value,
            self.meta.clone(),
            RuleKind::Combine,
            vec![a.into_node(), b.into_node(), c.into_node()],
        ))
    }

    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        self.a.collect_data_breakpoints(grunnlag, out);
        self.b.collect_data_breakpoints(grunnlag, out);
        self.c.collect_data_breakpoints(grunnlag, out);
    }
}

impl<G> Evaluate<G, Decimal> for Multiply<G> {
    fn graph(&self) -> &dyn RuleGraph {
        self
    }

    fn evaluate(
        &self,
        grunnlag: &G,
        ctx: &EvalContext,
    ) -> Result<EvaluatedValue<Decimal>, EvalError> {
        let factors = self
            .factors
            .iter()
            .map(|rule| rule.evaluate(grunnlag, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let value = numeric::product(factors.iter().map(|f| f.value)).ok_or_else(|| {
            ArithmeticOverflow {
                date: ctx.anchor(),
                rule: self.meta.clone(),
            }
        })?;
        Ok(EvaluatedValue::new(
            value,
            self.meta.clone(),
            RuleKind::Multiply,
            factors.into_iter().map(EvaluatedValue::into_node).collect(),
        ))
    }

    fn data_breakpoints(&self, grunnlag: &G, out: &mut BTreeSet<Date>) {
        for rule in &self.factors {
            rule.collect_data_breakpoints(grunnlag, out);
        }
    }
}

impl<G: 'static, T: RuleValue> Rule<G, T> {
    /// Apply `f` to the value of one child rule.
    pub fn combine1<A, F>(meta: RuleMeta, a: Rule<G, A>, f: F) -> Self
    where
        A: RuleValue,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        Rule::from_node(Combine1 { meta, a, f })
    }

    /// Apply `f` to the values of two child rules.
    pub fn combine2<A, B, F>(meta: RuleMeta, a: Rule<G, A>, b: Rule<G, B>, f: F) -> Self
    where
        A: RuleValue,
        B: RuleValue,
        F: Fn(&A, &B) -> T + Send + Sync + 'static,
    {
        Rule::from_node(Combine2 { meta, a, b, f })
    }

    /// Apply `f` to the values of three child rules.
    pub fn combine3<A, B, C, F>(
        meta: RuleMeta,
        a: Rule<G, A>,
        b: Rule<G, B>,
        c: Rule<G, C>,
        f: F,
    ) -> Self
    where
        A: RuleValue,
        B: RuleValue,
        C: RuleValue,
        F: Fn(&A, &B, &C) -> T + Send + Sync + 'static,
    {
        Rule::from_node(Combine3 { meta, a, b, c, f })
    }

    /// Chain a unary step onto this rule: `self` becomes the only child.
    pub fn map<U, F>(&self, meta: RuleMeta, f: F) -> Rule<G, U>
    where
        U: RuleValue,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        Rule::combine1(meta, self.clone(), f)
    }
}

impl<G: 'static> Rule<G, Decimal> {
    /// The exact product of all `factors`. No rounding is applied.
    ///
    /// A product outside the range of `Decimal` fails evaluation with
    /// [`ArithmeticOverflow`].
    pub fn multiply(
        meta: RuleMeta,
        factors: Vec<Rule<G, Decimal>>,
    ) -> Result<Self, DefinitionError> {
        if factors.len() < 2 {
            return Err(DefinitionError::TooFewOperands {
                reference: meta.reference,
                required: 2,
                actual: factors.len(),
            });
        }
        Ok(Rule::from_node(Multiply { meta, factors }))
    }
}
