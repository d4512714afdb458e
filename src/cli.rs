use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "lakeassess",
    version,
    about = "Local lake monitoring report assessment and trend tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Assess(AssessArgs),
    Score(ScoreArgs),
    Rules(RulesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AssessArgs {
    /// Documents manifest produced by the external extraction step.
    #[arg(long)]
    pub documents: PathBuf,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Batch outcome manifest path; stdout when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = AssessMode::Full)]
    pub mode: AssessMode,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AssessMode {
    /// Compliance scoring plus trend analysis for qualifying lakes.
    Full,
    /// Compliance scoring only; grouping and trends are skipped.
    ComplianceOnly,
}

impl AssessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::ComplianceOnly => "compliance-only",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub documents: PathBuf,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Validate only; suppress the resolved configuration dump.
    #[arg(long, default_value_t = false)]
    pub check: bool,
}
