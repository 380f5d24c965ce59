use lantern_core::trace::ingest::upgrade_file;
use tracing::info;

use crate::cli::args::UpgradeArgs;
use crate::exit_codes;

pub fn run(args: UpgradeArgs) -> anyhow::Result<i32> {
    match upgrade_file(&args.input, &args.output) {
        Ok(stats) => {
            info!(
                runs = stats.run_count,
                upgraded = stats.upgraded_count,
                "trace upgraded"
            );
            eprintln!(
                "✔ Wrote {} run{} to {} ({} upgraded from legacy records)",
                stats.run_count,
                if stats.run_count != 1 { "s" } else { "" },
                args.output.display(),
                stats.upgraded_count
            );
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("✖ Upgrade failed: {}", e);
            Ok(exit_codes::INPUT_ERROR)
        }
    }
}
