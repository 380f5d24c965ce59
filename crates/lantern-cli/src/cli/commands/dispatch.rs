use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Validate(args) => super::validate::run(args),
        Command::Tree(args) => super::tree::run(args),
        Command::Upgrade(args) => super::upgrade::run(args),
        Command::Embed(args) => super::embed::run(args).await,
        Command::RunTypes => super::run_types::run(),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
