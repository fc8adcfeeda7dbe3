//! Reproducibility stamp over the rule definitions used in a run.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::rule::RuleGraph;

const ENGINE: &str = concat!("regel-engine/", env!("CARGO_PKG_VERSION"));

/// Engine release plus a SHA-256 digest of the rule graph's definitions.
///
/// The digest covers kind, reference, version label, validFrom and
/// description of every node, in graph order. Combining functions are
/// code and cannot be hashed; changing one must come with a new version
/// label on its rule reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineVersion {
    engine: String,
    digest: String,
}

impl EngineVersion {
    pub fn of(rule: &dyn RuleGraph) -> Self {
        let mut canonical = String::new();
        write_canonical(rule, 0, &mut canonical);
        let hash = Sha256::digest(canonical.as_bytes());
        EngineVersion {
            engine: ENGINE.to_string(),
            digest: format!("{:x}", hash),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+sha256:{}", self.engine, self.digest)
    }
}

fn write_canonical(rule: &dyn RuleGraph, depth: usize, out: &mut String) {
    let meta = rule.meta();
    out.push_str(&format!(
        "{}|{}|{}|{}|{}|{}\n",
        depth,
        rule.kind(),
        meta.reference.id,
        meta.reference.version,
        meta.valid_from,
        meta.description
    ));
    for child in rule.children() {
        write_canonical(child, depth + 1, out);
    }
}
