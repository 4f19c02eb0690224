//! CLI argument definitions for fairval.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `chart` | Price vs fair-value chart model with optional statistics |
//! | `pe` | Trailing-window price/earnings averages |
//! | `cagr` | Compound annual growth between two closes |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--timeout-ms` | config (`10000`) | Request timeout in ms |
//! | `--config` | `fairval.toml` if present | TOML configuration file |
//! | `--fundamentals-source` | config (`auto`) | Fundamentals provider |
//! | `--as-of` | today | Reference date for trailing windows |
//!
//! # Examples
//!
//! ```bash
//! fairval chart AAPL --pretty
//! fairval chart MSFT --method ocf --period annual --multiple 20 --log-scale
//! fairval chart AAPL --pe-stats --cagr-start 2020-01-02 --cagr-end 2023-01-03
//! fairval pe AAPL --format table
//! fairval cagr TSLA --start 2019-01-02 --end 2024-01-02
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Stock price versus fundamental fair-value dashboard.
#[derive(Debug, Parser)]
#[command(
    name = "fairval",
    author,
    version,
    about = "Stock price vs fundamental fair-value dashboard"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Request timeout in milliseconds; overrides configuration.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fundamentals provider; overrides configuration.
    #[arg(long, global = true, value_enum)]
    pub fundamentals_source: Option<SourceSelector>,

    /// Reference date (YYYY-MM-DD) for trailing windows and the price range end.
    #[arg(long, global = true)]
    pub as_of: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON envelope.
    Json,
    /// Human-readable summary.
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Alpha Vantage when a key is configured, otherwise Yahoo.
    Auto,
    Alphavantage,
    Yahoo,
    /// Skip fundamentals; charts are price-only.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Reported earnings per share.
    Eps,
    /// Operating cash flow per share.
    Ocf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Annual,
    Quarterly,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chart model of the close price against fair-value lines.
    ///
    ///   fairval chart AAPL
    ///   fairval chart AAPL --multiple 15 --second-multiple 25 --log-scale
    Chart(ChartArgs),

    /// Average price/fundamental ratio over trailing windows.
    ///
    ///   fairval pe AAPL
    ///   fairval pe MSFT --method ocf --period annual
    Pe(PeArgs),

    /// Compound annual growth rate between two trading days.
    ///
    ///   fairval cagr AAPL --start 2020-01-02 --end 2023-01-03
    Cagr(CagrArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ValuationArgs {
    /// Fundamental basis of the fair-value line.
    #[arg(long, value_enum, default_value_t = MethodArg::Eps)]
    pub method: MethodArg,

    /// Reporting period; defaults to the configured period.
    #[arg(long, value_enum)]
    pub period: Option<PeriodArg>,
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    #[command(flatten)]
    pub valuation: ValuationArgs,

    /// Fair-value multiple; defaults to the historical estimate.
    #[arg(long)]
    pub multiple: Option<f64>,

    /// Optional second fair-value multiple.
    #[arg(long)]
    pub second_multiple: Option<f64>,

    /// Logarithmic y axis.
    #[arg(long, default_value_t = false)]
    pub log_scale: bool,

    /// Start of the visible date range (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<String>,

    /// End of the visible date range (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<String>,

    /// Include trailing-window P/E averages.
    #[arg(long, default_value_t = false)]
    pub pe_stats: bool,

    /// CAGR start date (YYYY-MM-DD).
    #[arg(long, requires = "cagr_end")]
    pub cagr_start: Option<String>,

    /// CAGR end date (YYYY-MM-DD).
    #[arg(long, requires = "cagr_start")]
    pub cagr_end: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct PeArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    #[command(flatten)]
    pub valuation: ValuationArgs,
}

#[derive(Debug, Clone, Args)]
pub struct CagrArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    /// First trading day (YYYY-MM-DD).
    #[arg(long)]
    pub start: String,

    /// Last trading day (YYYY-MM-DD).
    #[arg(long)]
    pub end: String,
}
