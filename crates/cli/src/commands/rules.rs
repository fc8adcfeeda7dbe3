use std::process;

use regel_engine::{applied_rules, EngineVersion};
use serde_json::json;

use crate::library::reconciliation;
use crate::{report_error, OutputFormat};

/// Print every rule reference in the reconciliation library.
pub(crate) fn cmd_rules(output: OutputFormat, quiet: bool) {
    let rule = match reconciliation() {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("error: rule library: {}", e), output, quiet);
            process::exit(1);
        }
    };
    if quiet {
        return;
    }

    let references = applied_rules(rule.graph());
    let version = EngineVersion::of(rule.graph());
    match output {
        OutputFormat::Json => {
            let value = json!({
                "engine_version": version.to_string(),
                "rules": references
                    .iter()
                    .map(|r| json!({ "id": r.id, "version": r.version }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", value);
        }
        OutputFormat::Text => {
            for r in &references {
                println!("{}", r);
            }
            println!("engine {}", version);
        }
    }
}
