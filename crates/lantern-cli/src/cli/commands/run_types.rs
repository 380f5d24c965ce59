use lantern_core::trace::run_type::KNOWN_RUN_TYPES;

use crate::exit_codes;

pub fn run() -> anyhow::Result<i32> {
    for tag in KNOWN_RUN_TYPES {
        println!("{}", tag);
    }
    Ok(exit_codes::SUCCESS)
}
