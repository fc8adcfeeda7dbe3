use std::path::Path;
use std::process;

use regel_engine::{run, RegelPeriode};
use tracing::info;

use crate::grunnlag;
use crate::library::reconciliation;
use crate::render;
use crate::{report_error, OutputFormat};

/// Exit code when the rules have no valid variant for part of the period.
const EXIT_INVALID_FOR_PERIOD: i32 = 2;

pub(crate) fn cmd_run(
    grunnlag_path: &Path,
    period: RegelPeriode,
    explain: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let grunnlag = match grunnlag::load(grunnlag_path, period.start()) {
        Ok(g) => g,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let rule = match reconciliation() {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("error: rule library: {}", e), output, quiet);
            process::exit(1);
        }
    };

    info!(grunnlag = %grunnlag_path.display(), period = %period, "running reconciliation");
    let result = run(&rule, &grunnlag, period);

    if !quiet {
        match output {
            OutputFormat::Json => {
                let value = render::run_json(&result, explain);
                match serde_json::to_string_pretty(&value) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        report_error(&format!("error: serialization: {}", e), output, quiet);
                        process::exit(1);
                    }
                }
            }
            OutputFormat::Text => print!("{}", render::run_text(&result, explain)),
        }
    }

    if !result.is_success() {
        process::exit(EXIT_INVALID_FOR_PERIOD);
    }
}
