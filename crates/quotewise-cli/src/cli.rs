//! CLI argument definitions for quotewise.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Resolve live prices for one or more tickers |
//! | `parse` | Validate and classify tickers without any network call |
//! | `exchanges` | List recognized exchange codes |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--cache-ttl-secs` | `300` | Lifetime of cached outcomes |
//! | `--deadline-ms` | none | Upper bound on one resolution |
//!
//! # Examples
//!
//! ```bash
//! quotewise quote AAPL NSE:RELIANCE --pretty
//! quotewise parse nse:reliance XYZ123 --format table
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Multi-source stock quote resolver.
///
/// Accepts `SYMBOL` or `EXCHANGE:SYMBOL` tickers and tries several price
/// providers in a fixed order until one answers.
#[derive(Debug, Parser)]
#[command(name = "quotewise", author, version, about = "Multi-source stock quote resolver")]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: one JSON object, or an array for several tickers (default)
    /// - ndjson: one JSON object per line
    /// - table: aligned columns for terminals
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Lifetime of cached outcomes in seconds. 0 disables the cache.
    #[arg(long, global = true)]
    pub cache_ttl_secs: Option<u64>,

    /// Overall budget for one ticker's provider chain, in milliseconds.
    #[arg(long, global = true)]
    pub deadline_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the current price of one or more tickers.
    ///
    /// Tickers are resolved concurrently. Exit code is 3 when any ticker
    /// could not be priced.
    ///
    ///   quotewise quote AAPL
    ///   quotewise quote NASDAQ:GOOGL NSE:RELIANCE --format table
    Quote(TickerArgs),

    /// Validate and classify tickers, showing the provider order that would
    /// be used. Makes no network calls.
    Parse(TickerArgs),

    /// List recognized exchange codes by region.
    Exchanges,
}

#[derive(Debug, Args)]
pub struct TickerArgs {
    /// One or more tickers (e.g. AAPL, NASDAQ:GOOGL, nse:reliance).
    #[arg(required = true, num_args = 1..)]
    pub tickers: Vec<String>,
}
