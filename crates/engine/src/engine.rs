//! Periodized execution.
//!
//! A run partitions the query period at every breakpoint of the rule
//! graph and of the data it reads, evaluates the rule once per
//! sub-period with the sub-period's start as anchor date, and either
//! returns every result in chronological order or, if any sub-period
//! failed (no valid rule variant, or arithmetic overflow), a structured
//! [`InvalidForPeriod`]. A run is all-or-nothing: no partial results are
//! returned for a query that is invalid anywhere in range.
//!
//! Runs are stateless; the same inputs always give the same result.

use std::collections::BTreeSet;

use time::Date;
use tracing::{debug, trace};

use crate::error::{EvalError, FailureReason};
use crate::period::RegelPeriode;
use crate::provenance::EvaluatedValue;
use crate::rule::{EvalContext, Rule, RuleMeta, RuleValue};
use crate::varying::PeriodVarying;
use crate::version::EngineVersion;

/// One sub-period and the rule's value for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodResult<T> {
    pub period: RegelPeriode,
    pub result: EvaluatedValue<T>,
}

/// A rule that failed for one or more sub-periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffendingRule {
    pub rule: RuleMeta,
    pub reason: FailureReason,
    /// Chronological.
    pub periods: Vec<RegelPeriode>,
}

/// The query could not be evaluated for the whole period.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "rule evaluation failed for part of the period ({} rule(s), first: {})",
    .offending_rules.len(),
    .offending_rules.first().map(|o| o.rule.reference.to_string()).unwrap_or_default()
)]
pub struct InvalidForPeriod {
    pub offending_rules: Vec<OffendingRule>,
    pub engine_version: EngineVersion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleRunResult<T> {
    Success {
        periodized_results: Vec<PeriodResult<T>>,
        engine_version: EngineVersion,
    },
    InvalidForPeriod(InvalidForPeriod),
}

impl<T> RuleRunResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RuleRunResult::Success { .. })
    }

    pub fn engine_version(&self) -> &EngineVersion {
        match self {
            RuleRunResult::Success { engine_version, .. } => engine_version,
            RuleRunResult::InvalidForPeriod(invalid) => &invalid.engine_version,
        }
    }

    /// The result whose sub-period contains `date`, if the run succeeded.
    pub fn value_at(&self, date: Date) -> Option<&EvaluatedValue<T>> {
        match self {
            RuleRunResult::Success {
                periodized_results, ..
            } => periodized_results
                .iter()
                .find(|r| r.period.contains(date))
                .map(|r| &r.result),
            RuleRunResult::InvalidForPeriod(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Vec<PeriodResult<T>>, InvalidForPeriod> {
        match self {
            RuleRunResult::Success {
                periodized_results, ..
            } => Ok(periodized_results),
            RuleRunResult::InvalidForPeriod(invalid) => Err(invalid),
        }
    }
}

type Outcome<T> = (RegelPeriode, Result<EvaluatedValue<T>, EvalError>);

/// Run `rule` over `period` against a grunnlag that is constant for the
/// whole run (period-varying parts are read through
/// [`Rule::extract_at`]).
pub fn run<G, T: RuleValue>(
    rule: &Rule<G, T>,
    grunnlag: &G,
    period: RegelPeriode,
) -> RuleRunResult<T> {
    let sub_periods = partition(rule, grunnlag, period);
    let outcomes = sub_periods
        .into_iter()
        .map(|p| (p, evaluate_period(rule, grunnlag, p)))
        .collect();
    assemble(rule, period, outcomes)
}

/// Run `rule` over `period` against a grunnlag that itself varies over
/// time.
///
/// The grunnlag's breakpoints join the rule's. Each resulting sub-period
/// is evaluated against `grunnlag.at(sub_period.start())`, split further
/// where data read from that projection changes.
pub fn run_periodized<G, T, P>(
    rule: &Rule<G, T>,
    grunnlag: &P,
    period: RegelPeriode,
) -> RuleRunResult<T>
where
    T: RuleValue,
    P: PeriodVarying<G>,
{
    let mut outcomes = Vec::new();
    for outer in period.partition(&grunnlag_points(rule, grunnlag)) {
        let projected = grunnlag.at(outer.start());
        for inner in partition(rule, &projected, outer) {
            outcomes.push((inner, evaluate_period(rule, &projected, inner)));
        }
    }
    assemble(rule, period, outcomes)
}

/// [`run`] with sub-periods evaluated on the rayon thread pool.
#[cfg(feature = "parallel")]
pub fn run_parallel<G, T>(rule: &Rule<G, T>, grunnlag: &G, period: RegelPeriode) -> RuleRunResult<T>
where
    G: Sync,
    T: RuleValue,
{
    use rayon::prelude::*;

    let sub_periods = partition(rule, grunnlag, period);
    let outcomes = sub_periods
        .into_par_iter()
        .map(|p| (p, evaluate_period(rule, grunnlag, p)))
        .collect();
    assemble(rule, period, outcomes)
}

fn grunnlag_points<G, T, P: PeriodVarying<G>>(rule: &Rule<G, T>, grunnlag: &P) -> BTreeSet<Date> {
    let mut points = rule.breakpoints();
    points.extend(grunnlag.breakpoints());
    points
}

fn partition<G, T>(
    rule: &Rule<G, T>,
    grunnlag: &G,
    period: RegelPeriode,
) -> Vec<RegelPeriode> {
    let mut points = rule.breakpoints();
    rule.collect_data_breakpoints(grunnlag, &mut points);
    period.partition(&points)
}

fn evaluate_period<G, T>(
    rule: &Rule<G, T>,
    grunnlag: &G,
    period: RegelPeriode,
) -> Result<EvaluatedValue<T>, EvalError> {
    trace!(rule = %rule.reference(), period = %period, "evaluating sub-period");
    rule.evaluate(grunnlag, &EvalContext::new(period.start()))
}

fn assemble<G, T>(
    rule: &Rule<G, T>,
    period: RegelPeriode,
    outcomes: Vec<Outcome<T>>,
) -> RuleRunResult<T> {
    let engine_version = EngineVersion::of(rule.graph());
    let sub_periods = outcomes.len();
    let mut results = Vec::with_capacity(sub_periods);
    let mut offending: Vec<OffendingRule> = Vec::new();

    for (sub_period, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(PeriodResult {
                period: sub_period,
                result,
            }),
            Err(err) => {
                let (failed, reason) = err.into_parts();
                match offending
                    .iter_mut()
                    .find(|o| o.rule == failed && o.reason == reason)
                {
                    Some(existing) => existing.periods.push(sub_period),
                    None => offending.push(OffendingRule {
                        rule: failed,
                        reason,
                        periods: vec![sub_period],
                    }),
                }
            }
        }
    }

    if offending.is_empty() {
        debug!(
            rule = %rule.reference(),
            period = %period,
            sub_periods,
            engine_version = %engine_version,
            "rule run succeeded"
        );
        RuleRunResult::Success {
            periodized_results: results,
            engine_version,
        }
    } else {
        debug!(
            rule = %rule.reference(),
            period = %period,
            sub_periods,
            offending = offending.len(),
            "rule run invalid for period"
        );
        RuleRunResult::InvalidForPeriod(InvalidForPeriod {
            offending_rules: offending,
            engine_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleReference;
    use time::macros::date;

    fn meta(id: &str, valid_from: Date) -> RuleMeta {
        RuleMeta::new(valid_from, id, RuleReference::new(id, "1"))
    }

    fn stepped() -> Rule<(), i64> {
        Rule::latest_valid_variant(
            meta("step", date!(2021 - 01 - 01)),
            vec![
                Rule::constant(meta("one", date!(2021 - 01 - 01)), 1),
                Rule::constant(meta("two", date!(2022 - 01 - 01)), 2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn success_helpers() {
        let period = RegelPeriode::bounded(date!(2021 - 06 - 01), date!(2022 - 06 - 01)).unwrap();
        let result = run(&stepped(), &(), period);
        assert!(result.is_success());
        assert_eq!(result.value_at(date!(2021 - 12 - 31)).unwrap().value, 1);
        assert_eq!(result.value_at(date!(2022 - 01 - 01)).unwrap().value, 2);
        assert!(result.value_at(date!(2022 - 06 - 01)).is_none());
        assert_eq!(result.into_result().unwrap().len(), 2);
    }

    #[test]
    fn failing_sub_periods_are_grouped_per_rule() {
        let period = RegelPeriode::bounded(date!(2019 - 01 - 01), date!(2022 - 06 - 01)).unwrap();
        let result = run(&stepped(), &(), period);
        assert!(!result.is_success());
        assert!(result.value_at(date!(2021 - 06 - 01)).is_none());
        let invalid = result.into_result().unwrap_err();
        assert_eq!(invalid.offending_rules.len(), 1);
        assert_eq!(invalid.offending_rules[0].rule.reference.id, "step");
        assert_eq!(
            invalid.offending_rules[0].periods,
            vec![RegelPeriode::bounded(date!(2019 - 01 - 01), date!(2021 - 01 - 01)).unwrap()]
        );
        assert!(invalid.to_string().contains("step@1"));
    }

    #[test]
    fn engine_version_is_attached_to_both_outcomes() {
        let ok = run(
            &stepped(),
            &(),
            RegelPeriode::open(date!(2021 - 01 - 01)),
        );
        let bad = run(
            &stepped(),
            &(),
            RegelPeriode::open(date!(2020 - 01 - 01)),
        );
        assert_eq!(ok.engine_version(), bad.engine_version());
    }

    #[test]
    fn overflow_is_reported_per_sub_period_instead_of_panicking() {
        use rust_decimal::Decimal;

        let huge = |id: &str, valid_from: Date| Rule::constant(meta(id, valid_from), Decimal::MAX);
        let factor = Rule::latest_valid_variant(
            meta("factor", date!(2021 - 01 - 01)),
            vec![
                Rule::constant(meta("small", date!(2021 - 01 - 01)), Decimal::TWO),
                huge("huge", date!(2022 - 01 - 01)),
            ],
        )
        .unwrap();
        let product: Rule<(), Decimal> = Rule::multiply(
            meta("product", date!(2021 - 01 - 01)),
            vec![huge("max", date!(2021 - 01 - 01)), factor],
        )
        .unwrap();

        let period = RegelPeriode::bounded(date!(2020 - 06 - 01), date!(2023 - 01 - 01)).unwrap();
        let invalid = run(&product, &(), period).into_result().unwrap_err();

        let got: Vec<_> = invalid
            .offending_rules
            .iter()
            .map(|o| (o.rule.reference.id.as_str(), o.reason, o.periods.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                (
                    "factor",
                    FailureReason::NoValidVariant,
                    vec![RegelPeriode::bounded(date!(2020 - 06 - 01), date!(2021 - 01 - 01)).unwrap()],
                ),
                (
                    "product",
                    FailureReason::Overflow,
                    vec![
                        RegelPeriode::bounded(date!(2021 - 01 - 01), date!(2022 - 01 - 01)).unwrap(),
                        RegelPeriode::bounded(date!(2022 - 01 - 01), date!(2023 - 01 - 01)).unwrap(),
                    ],
                ),
            ]
        );
    }

    #[test]
    fn product_of_max_values_is_invalid_not_a_panic() {
        use rust_decimal::Decimal;

        let max = |id: &str| Rule::constant(meta(id, date!(2021 - 01 - 01)), Decimal::MAX);
        let product: Rule<(), Decimal> =
            Rule::multiply(meta("p", date!(2021 - 01 - 01)), vec![max("a"), max("b")]).unwrap();
        let result = run(&product, &(), RegelPeriode::open(date!(2021 - 01 - 01)));
        let invalid = result.into_result().unwrap_err();
        assert_eq!(invalid.offending_rules.len(), 1);
        assert_eq!(invalid.offending_rules[0].reason, FailureReason::Overflow);
        assert_eq!(
            invalid.offending_rules[0].periods,
            vec![RegelPeriode::open(date!(2021 - 01 - 01))]
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_run_matches_sequential() {
        for start in [date!(2019 - 01 - 01), date!(2021 - 03 - 01)] {
            let period = RegelPeriode::bounded(start, date!(2023 - 01 - 01)).unwrap();
            assert_eq!(
                run_parallel(&stepped(), &(), period),
                run(&stepped(), &(), period)
            );
        }
    }
}
