//! Sample rule library: annual reconciliation (etteroppgjør).
//!
//! Compares what was paid out per month with what should have been paid
//! after the final income deduction, and classifies the difference
//! against thresholds expressed in rettsgebyr (the court fee unit).

use regel_engine::numeric::{Rounding, RoundingStrategy};
use regel_engine::{DefinitionError, Fact, Rule, RuleMeta, RuleReference, Schedule};
use rust_decimal::Decimal;
use time::macros::date;
use time::Date;

const VERSION: &str = "2024.1";

/// Input for one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconciliationGrunnlag {
    /// Monthly amount before income deduction.
    pub brutto: Schedule<Fact<Decimal>>,
    /// Monthly amount already paid out.
    pub utbetalt: Schedule<Fact<Decimal>>,
    /// Monthly deduction from the final income.
    pub avkorting: Fact<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Tilbakekreving,
    Etterbetaling,
    IngenEndring,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Tilbakekreving => "TILBAKEKREVING",
            OutcomeKind::Etterbetaling => "ETTERBETALING",
            OutcomeKind::IngenEndring => "INGEN_ENDRING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    /// Paid minus owed; positive means overpaid.
    pub differanse: Decimal,
}

fn meta(id: &str, valid_from: Date, description: &str) -> RuleMeta {
    RuleMeta::new(valid_from, description, RuleReference::new(id, VERSION))
}

fn rettsgebyr() -> Result<Rule<ReconciliationGrunnlag, Decimal>, DefinitionError> {
    let yearly = [
        (date!(2023 - 01 - 01), 1_243),
        (date!(2024 - 01 - 01), 1_277),
        (date!(2025 - 01 - 01), 1_314),
    ];
    let candidates = yearly
        .iter()
        .map(|(valid_from, amount)| {
            Rule::constant(
                meta(
                    &format!("RETTSGEBYR-{}", valid_from.year()),
                    *valid_from,
                    "Rettsgebyr",
                ),
                Decimal::from(*amount),
            )
        })
        .collect();
    Rule::latest_valid_variant(
        meta("RETTSGEBYR", date!(2023 - 01 - 01), "Gjeldende rettsgebyr"),
        candidates,
    )
}

/// Classify a difference against one rettsgebyr (overpaid) and
/// `etterbetaling_terskel` (underpaid). Both bounds are exclusive.
pub fn classify(differanse: Decimal, rettsgebyr: Decimal, etterbetaling_terskel: Decimal) -> Outcome {
    let kind = if differanse > rettsgebyr {
        OutcomeKind::Tilbakekreving
    } else if differanse < -etterbetaling_terskel {
        OutcomeKind::Etterbetaling
    } else {
        OutcomeKind::IngenEndring
    };
    Outcome { kind, differanse }
}

/// The full reconciliation rule graph.
pub fn reconciliation() -> Result<Rule<ReconciliationGrunnlag, Outcome>, DefinitionError> {
    let from = date!(2023 - 01 - 01);
    let whole_kroner = Rounding::whole(RoundingStrategy::MidpointAwayFromZero);

    let rettsgebyr = rettsgebyr()?;
    let brutto: Rule<ReconciliationGrunnlag, Decimal> = Rule::extract_at(
        meta("BRUTTO", from, "Ytelse før avkorting"),
        |g: &ReconciliationGrunnlag| &g.brutto,
    );
    let avkorting: Rule<ReconciliationGrunnlag, Decimal> = Rule::extract(
        meta("AVKORTING", from, "Avkorting etter endelig inntekt"),
        |g: &ReconciliationGrunnlag| &g.avkorting,
    );
    let utbetalt: Rule<ReconciliationGrunnlag, Decimal> = Rule::extract_at(
        meta("UTBETALT", from, "Utbetalt ytelse"),
        |g: &ReconciliationGrunnlag| &g.utbetalt,
    );

    let ny_ytelse = Rule::combine2(
        meta("NY-YTELSE", from, "Ytelse etter avkorting"),
        brutto,
        avkorting,
        move |brutto: &Decimal, avkorting: &Decimal| {
            whole_kroner.apply((*brutto - *avkorting).max(Decimal::ZERO))
        },
    );
    let differanse = Rule::combine2(
        meta("DIFFERANSE", from, "Utbetalt minus ny ytelse"),
        utbetalt,
        ny_ytelse,
        |utbetalt: &Decimal, ny: &Decimal| *utbetalt - *ny,
    );
    let kvart: Rule<ReconciliationGrunnlag, Decimal> = Rule::constant(
        meta("ANDEL-ETTERBETALING", from, "Andel rettsgebyr for etterbetaling"),
        Decimal::new(25, 2),
    );
    let etterbetaling_terskel = Rule::multiply(
        meta("TERSKEL-ETTERBETALING", from, "Terskel for etterbetaling"),
        vec![rettsgebyr.clone(), kvart],
    )?;

    Ok(Rule::combine3(
        meta("ETTEROPPGJOER-RESULTAT", from, "Resultat av etteroppgjør"),
        differanse,
        rettsgebyr,
        etterbetaling_terskel,
        |differanse: &Decimal, rettsgebyr: &Decimal, terskel: &Decimal| {
            classify(*differanse, *rettsgebyr, *terskel)
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regel_engine::{run, RegelPeriode};

    fn amount(value: i64) -> Fact<Decimal> {
        Fact::new(Decimal::from(value), "test", "beløp")
    }

    fn grunnlag() -> ReconciliationGrunnlag {
        ReconciliationGrunnlag {
            brutto: Schedule::new(amount(20_000)),
            utbetalt: Schedule::new(amount(20_000))
                .with_change(date!(2024 - 07 - 01), amount(18_000)),
            avkorting: amount(1_500),
        }
    }

    #[test]
    fn library_builds() {
        assert!(reconciliation().is_ok());
    }

    #[test]
    fn classify_uses_exclusive_thresholds() {
        let r = Decimal::from(1_277);
        let t = Decimal::new(31925, 2);
        assert_eq!(classify(Decimal::from(1_278), r, t).kind, OutcomeKind::Tilbakekreving);
        assert_eq!(classify(r, r, t).kind, OutcomeKind::IngenEndring);
        assert_eq!(classify(-t, r, t).kind, OutcomeKind::IngenEndring);
        assert_eq!(classify(Decimal::from(-320), r, t).kind, OutcomeKind::Etterbetaling);
    }

    #[test]
    fn reconciliation_over_2024() {
        let rule = reconciliation().unwrap();
        let period = RegelPeriode::bounded(date!(2024 - 01 - 01), date!(2025 - 01 - 01)).unwrap();
        let results = run(&rule, &grunnlag(), period).into_result().unwrap();

        let got: Vec<_> = results
            .iter()
            .map(|r| (r.period.start(), r.result.value.kind, r.result.value.differanse))
            .collect();
        assert_eq!(
            got,
            vec![
                (date!(2024 - 01 - 01), OutcomeKind::Tilbakekreving, Decimal::from(1_500)),
                (date!(2024 - 07 - 01), OutcomeKind::Etterbetaling, Decimal::from(-500)),
            ]
        );
    }

    #[test]
    fn rettsgebyr_changes_split_the_year_boundary() {
        let rule = reconciliation().unwrap();
        let period = RegelPeriode::bounded(date!(2024 - 11 - 01), date!(2025 - 03 - 01)).unwrap();
        let results = run(&rule, &grunnlag(), period).into_result().unwrap();
        assert_eq!(results.len(), 2);
        // -500 is below the underpaid threshold of both years.
        assert!(results
            .iter()
            .all(|r| r.result.value.kind == OutcomeKind::Etterbetaling));
    }

    #[test]
    fn before_first_rettsgebyr_is_invalid() {
        let rule = reconciliation().unwrap();
        let period = RegelPeriode::bounded(date!(2022 - 01 - 01), date!(2023 - 01 - 01)).unwrap();
        let invalid = run(&rule, &grunnlag(), period).into_result().unwrap_err();
        assert_eq!(invalid.offending_rules[0].rule.reference.id, "RETTSGEBYR");
    }
}
