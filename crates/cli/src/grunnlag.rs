//! JSON input for the reconciliation library.

use std::path::Path;

use regel_engine::{Fact, Schedule};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::macros::format_description;
use time::Date;

use crate::library::ReconciliationGrunnlag;

#[derive(Debug, thiserror::Error)]
pub(crate) enum GrunnlagError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid date '{value}' (expected YYYY-MM-DD)")]
    Date {
        value: String,
        source: time::error::Parse,
    },

    #[error("'{field}' must have at least one entry")]
    EmptySchedule { field: &'static str },

    #[error("period starts {from}, before the first '{field}' entry ({first})")]
    BeforeFirstEntry {
        field: &'static str,
        first: Date,
        from: Date,
    },
}

#[derive(Debug, Deserialize)]
struct GrunnlagFile {
    brutto: Vec<AmountEntry>,
    utbetalt: Vec<AmountEntry>,
    avkorting: AmountFact,
}

#[derive(Debug, Deserialize)]
struct AmountEntry {
    fra: String,
    #[serde(with = "rust_decimal::serde::str")]
    beloep: Decimal,
    kilde: String,
}

#[derive(Debug, Deserialize)]
struct AmountFact {
    #[serde(with = "rust_decimal::serde::str")]
    beloep: Decimal,
    kilde: String,
    #[serde(default)]
    beskrivelse: Option<String>,
}

pub(crate) fn parse_date(value: &str) -> Result<Date, GrunnlagError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|source| {
        GrunnlagError::Date {
            value: value.to_string(),
            source,
        }
    })
}

/// Load the grunnlag for a run whose period starts on `from`.
pub(crate) fn load(path: &Path, from: Date) -> Result<ReconciliationGrunnlag, GrunnlagError> {
    let text = std::fs::read_to_string(path).map_err(|source| GrunnlagError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text, from).map_err(|e| match e {
        GrunnlagError::Json { source, .. } => GrunnlagError::Json {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

pub(crate) fn parse(text: &str, from: Date) -> Result<ReconciliationGrunnlag, GrunnlagError> {
    let file: GrunnlagFile = serde_json::from_str(text).map_err(|source| GrunnlagError::Json {
        path: "<input>".to_string(),
        source,
    })?;
    Ok(ReconciliationGrunnlag {
        brutto: schedule("brutto", file.brutto, "Ytelse før avkorting", from)?,
        utbetalt: schedule("utbetalt", file.utbetalt, "Utbetalt ytelse", from)?,
        avkorting: Fact::new(
            file.avkorting.beloep,
            file.avkorting.kilde,
            file.avkorting
                .beskrivelse
                .unwrap_or_else(|| "Avkorting etter endelig inntekt".to_string()),
        ),
    })
}

/// Build a schedule from dated entries. A run may not start before the
/// earliest entry, so no sub-period ever reads an unrecorded amount.
fn schedule(
    field: &'static str,
    entries: Vec<AmountEntry>,
    description: &str,
    from: Date,
) -> Result<Schedule<Fact<Decimal>>, GrunnlagError> {
    let mut dated = entries
        .into_iter()
        .map(|e| {
            let date = parse_date(&e.fra)?;
            Ok::<_, GrunnlagError>((date, Fact::new(e.beloep, e.kilde, description)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    dated.sort_by_key(|(date, _)| *date);

    let (first, initial) = dated
        .first()
        .map(|(date, fact)| (*date, fact.clone()))
        .ok_or(GrunnlagError::EmptySchedule { field })?;
    if from < first {
        return Err(GrunnlagError::BeforeFirstEntry { field, first, from });
    }
    Ok(dated
        .into_iter()
        .fold(Schedule::new(initial), |s, (date, fact)| s.with_change(date, fact)))
}
