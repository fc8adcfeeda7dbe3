//! Provenance-tagged leaf input values.

use std::fmt;

use crate::provenance::FactNode;

/// An immutable input value together with who asserted it.
///
/// `source` names the producer (a case worker ident, an external
/// register, the system clock) and `description` says what the value is.
/// Facts are never changed after construction; a corrected value is a new
/// fact. Two facts built from equal parts compare equal but remain
/// distinct values; nothing is deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fact<T> {
    value: T,
    source: String,
    description: String,
}

impl<T> Fact<T> {
    pub fn new(value: T, source: impl Into<String>, description: impl Into<String>) -> Self {
        Fact {
            value,
            source: source.into(),
            description: description.into(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: fmt::Debug> Fact<T> {
    /// Provenance leaf for this fact.
    pub fn to_node(&self) -> FactNode {
        FactNode {
            value: format!("{:?}", self.value),
            source: self.source.clone(),
            description: self.description.clone(),
        }
    }
}
