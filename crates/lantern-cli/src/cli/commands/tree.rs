use lantern_core::trace::ingest::load_trace;
use lantern_core::Run;

use crate::cli::args::TreeArgs;
use crate::exit_codes;

pub fn run(args: TreeArgs) -> anyhow::Result<i32> {
    let runs = match load_trace(&args.trace) {
        Ok(runs) => runs,
        Err(e) => {
            eprintln!("✖ Failed to load trace: {}", e);
            return Ok(exit_codes::INPUT_ERROR);
        }
    };

    for root in &runs {
        for (depth, run) in root.walk() {
            println!("{}{}", "  ".repeat(depth), describe(run));
        }
    }
    Ok(exit_codes::SUCCESS)
}

/// `name [run_type] status duration`
fn describe(run: &Run) -> String {
    let status = match (&run.base.error, run.is_closed()) {
        (Some(error), _) => format!("error: {}", first_line(error)),
        (None, true) => "ok".to_string(),
        (None, false) => "open".to_string(),
    };
    let duration = run
        .duration()
        .map(|d| format!("{:.3}s", d.num_milliseconds() as f64 / 1000.0))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} [{}] {} {}",
        run.base.name, run.base.run_type, status, duration
    )
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
