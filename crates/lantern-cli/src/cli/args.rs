use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lantern",
    version,
    about = "Validate, inspect and upgrade execution traces of LLM applications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a trace file for structural problems
    Validate(ValidateArgs),
    /// Print the run tree of a trace file
    Tree(TreeArgs),
    /// Rewrite a trace (legacy or current) as current-generation JSONL
    Upgrade(UpgradeArgs),
    /// Embed texts with the configured provider
    Embed(EmbedArgs),
    /// List the recognized run types
    RunTypes,
    Version,
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum ValidateOutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Clone, Debug)]
pub struct ValidateArgs {
    /// Trace file: JSON array, single JSON object or JSONL
    pub trace: PathBuf,

    #[arg(long, value_enum, default_value_t = ValidateOutputFormat::Text)]
    pub format: ValidateOutputFormat,

    /// Accept runs without end_time (traces still in flight)
    #[arg(long)]
    pub allow_open: bool,

    /// Do not warn about run types outside the known set
    #[arg(long)]
    pub no_unknown_type_warnings: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct TreeArgs {
    pub trace: PathBuf,
}

#[derive(Parser, Clone, Debug)]
pub struct UpgradeArgs {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Parser, Clone, Debug)]
pub struct EmbedArgs {
    /// YAML embeddings config; defaults to LANTERN_EMBEDDINGS_* environment variables
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured provider (nlpcloud, fake). Without this flag
    /// the provider comes from --config, else LANTERN_EMBEDDINGS_PROVIDER.
    #[arg(long)]
    pub provider: Option<String>,

    /// Embed a single search query instead of documents
    #[arg(long)]
    pub query: bool,

    #[arg(required = true)]
    pub texts: Vec<String>,
}
