//! Text and JSON rendering of run results.

use regel_engine::{InvalidForPeriod, Node, PeriodResult, RegelPeriode, RuleMeta, RuleRunResult};
use serde_json::{json, Value};

use crate::library::Outcome;

pub(crate) fn period_json(period: &RegelPeriode) -> Value {
    json!({
        "from": period.start().to_string(),
        "to": period.end().map(|d| d.to_string()),
    })
}

fn rule_json(rule: &RuleMeta) -> Value {
    json!({
        "id": rule.reference.id,
        "version": rule.reference.version,
        "valid_from": rule.valid_from.to_string(),
        "description": rule.description,
    })
}

pub(crate) fn node_json(node: &Node) -> Value {
    match node {
        Node::Fact(fact) => json!({
            "fact": fact.value,
            "source": fact.source,
            "description": fact.description,
        }),
        Node::Rule(rule) => json!({
            "rule": rule_json(&rule.rule),
            "kind": rule.kind.as_str(),
            "value": rule.value,
            "children": rule.children.iter().map(node_json).collect::<Vec<_>>(),
        }),
    }
}

fn result_json(r: &PeriodResult<Outcome>, explain: bool) -> Value {
    let mut entry = json!({
        "period": period_json(&r.period),
        "outcome": r.result.value.kind.as_str(),
        "differanse": r.result.value.differanse.to_string(),
    });
    if explain {
        entry["explanation"] = node_json(&r.result.to_node());
    }
    entry
}

fn invalid_json(invalid: &InvalidForPeriod) -> Value {
    let offending: Vec<Value> = invalid
        .offending_rules
        .iter()
        .map(|o| {
            json!({
                "rule": rule_json(&o.rule),
                "reason": o.reason.as_str(),
                "periods": o.periods.iter().map(period_json).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "status": "invalid_for_period",
        "engine_version": invalid.engine_version.to_string(),
        "offending_rules": offending,
    })
}

pub(crate) fn run_json(result: &RuleRunResult<Outcome>, explain: bool) -> Value {
    match result {
        RuleRunResult::Success {
            periodized_results,
            engine_version,
        } => json!({
            "status": "success",
            "engine_version": engine_version.to_string(),
            "results": periodized_results
                .iter()
                .map(|r| result_json(r, explain))
                .collect::<Vec<_>>(),
        }),
        RuleRunResult::InvalidForPeriod(invalid) => invalid_json(invalid),
    }
}

pub(crate) fn run_text(result: &RuleRunResult<Outcome>, explain: bool) -> String {
    let mut out = String::new();
    match result {
        RuleRunResult::Success {
            periodized_results, ..
        } => {
            for r in periodized_results {
                out.push_str(&format!(
                    "{}  {}  differanse {}\n",
                    r.period,
                    r.result.value.kind.as_str(),
                    r.result.value.differanse
                ));
                if explain {
                    for line in r.result.to_string().lines() {
                        out.push_str(&format!("    {}\n", line));
                    }
                }
            }
        }
        RuleRunResult::InvalidForPeriod(invalid) => {
            out.push_str("rule run invalid for part of the period:\n");
            for o in &invalid.offending_rules {
                let periods: Vec<String> = o.periods.iter().map(|p| p.to_string()).collect();
                out.push_str(&format!(
                    "  {} ({}) {}: {}\n",
                    o.rule.reference,
                    o.rule.description,
                    o.reason,
                    periods.join(", ")
                ));
            }
        }
    }
    out.push_str(&format!("engine {}\n", result.engine_version()));
    out
}
