use lantern_core::errors::diagnostic::{codes, Diagnostic};
use lantern_core::trace::ingest::load_trace;
use lantern_core::trace::validate::{TraceValidator, ValidationReport, ValidatorOptions};
use serde::Serialize;
use serde_json::json;

use crate::cli::args::{ValidateArgs, ValidateOutputFormat};
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    // 1. Load Trace
    let runs = match load_trace(&args.trace) {
        Ok(runs) => runs,
        Err(e) => {
            let diag = Diagnostic::new(
                codes::E_TRACE_PARSE,
                format!("Failed to load trace: {}", e),
            )
            .with_source("ingest")
            .with_context(json!({ "file": args.trace.display().to_string() }));

            let report = ValidationReport {
                run_count: 0,
                diagnostics: vec![diag],
            };

            let exit_code = exit_codes::INPUT_ERROR;
            print_report(&report, &args, exit_code)?;
            return Ok(exit_code);
        }
    };

    // 2. Validate
    let validator = TraceValidator::new(ValidatorOptions {
        allow_open_runs: args.allow_open,
        warn_unknown_run_types: !args.no_unknown_type_warnings,
    });
    let report = validator.validate(&runs);

    // 3. Exit code, then report
    let exit_code = if report.has_errors() {
        exit_codes::VALIDATION_FAILED
    } else {
        exit_codes::SUCCESS
    };
    print_report(&report, &args, exit_code)?;

    Ok(exit_code)
}

fn print_report(
    report: &ValidationReport,
    args: &ValidateArgs,
    exit_code: i32,
) -> anyhow::Result<()> {
    match args.format {
        ValidateOutputFormat::Json => {
            let output_json = build_validate_json(report, args, exit_code);
            println!("{}", serde_json::to_string_pretty(&output_json)?);
        }
        ValidateOutputFormat::Text => {
            // Text format is always printed to stderr (human-readable)
            let errors_count = report.errors().count();
            let warnings_count = report.warnings().count();

            if errors_count > 0 {
                eprintln!(
                    "✖ Validation failed ({} error{}, {} warning{})",
                    errors_count,
                    plural(errors_count),
                    warnings_count,
                    plural(warnings_count)
                );
            } else if warnings_count > 0 {
                eprintln!(
                    "⚠️  Validation passed with warnings ({} run{}, {} warning{})",
                    report.run_count,
                    plural(report.run_count),
                    warnings_count,
                    plural(warnings_count)
                );
            } else {
                eprintln!(
                    "✔ Validation OK ({} run{})",
                    report.run_count,
                    plural(report.run_count)
                );
            }
            eprintln!();

            for d in &report.diagnostics {
                eprintln!("{}", d.format_terminal());
            }
        }
    }

    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n != 1 {
        "s"
    } else {
        ""
    }
}

fn build_validate_json(
    report: &ValidationReport,
    args: &ValidateArgs,
    exit_code: i32,
) -> serde_json::Value {
    let mut diags: Vec<&Diagnostic> = report.diagnostics.iter().collect();

    // Deterministic sort: severity_rank > code > message
    diags.sort_by(|a, b| {
        (severity_rank(&a.severity), a.code.as_str(), a.message.as_str()).cmp(&(
            severity_rank(&b.severity),
            b.code.as_str(),
            b.message.as_str(),
        ))
    });

    let diag_views: Vec<DiagView<'_>> = diags.iter().map(|d| DiagView::from(*d)).collect();
    let error_count = diag_views.iter().filter(|d| d.severity == "error").count();
    let warn_count = diag_views.len() - error_count;

    json!({
        "schema_version": 1,
        "ok": error_count == 0 && exit_code == exit_codes::SUCCESS,
        "exit_code": exit_code,

        "tool": {
            "name": "lantern",
            "version": env!("CARGO_PKG_VERSION")
        },

        "command": {
            "name": "validate",
            "trace_file": args.trace.display().to_string(),
            "allow_open": args.allow_open
        },

        "diagnostics": diag_views,

        "summary": {
            "run_count": report.run_count,
            "diagnostic_count": diag_views.len(),
            "error_count": error_count,
            "warn_count": warn_count
        }
    })
}

fn severity_rank(s: &str) -> u8 {
    match s {
        "error" => 0,
        "warn" => 1,
        _ => 2,
    }
}

#[derive(Serialize)]
struct DiagView<'a> {
    code: &'a str,
    severity: &'a str,
    source: &'a str,
    message: &'a str,
    context: &'a serde_json::Value,
    fix_steps: &'a [String],
}

impl<'a> From<&'a Diagnostic> for DiagView<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        Self {
            code: d.code.as_str(),
            severity: d.severity.as_str(),
            source: d.source.as_str(),
            message: d.message.as_str(),
            context: &d.context,
            fix_steps: &d.fix_steps,
        }
    }
}
