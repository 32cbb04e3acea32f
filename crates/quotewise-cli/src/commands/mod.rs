mod exchanges;
mod parse;
mod quote;

use std::sync::Arc;
use std::time::Duration;

use quotewise_core::{
    HttpClient, NoopHttpClient, QuoteResolver, QuoteResolverBuilder, ResolveResponse,
    ResolverConfig,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// One output record: its JSON form plus table cells.
pub struct Row {
    pub payload: Payload,
    pub cells: Vec<String>,
    pub ok: bool,
}

pub enum Payload {
    Response(ResolveResponse),
    Value(Value),
}

impl Payload {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Response(response) => response.to_json(),
            Self::Value(value) => value.clone(),
        }
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String, CliError> {
        Ok(match self {
            Self::Response(response) => response.to_json_string(pretty)?,
            Self::Value(value) if pretty => serde_json::to_string_pretty(value)?,
            Self::Value(value) => serde_json::to_string(value)?,
        })
    }
}

pub struct CommandResult {
    pub headers: &'static [&'static str],
    pub rows: Vec<Row>,
}

impl CommandResult {
    pub fn failures(&self) -> usize {
        self.rows.iter().filter(|row| !row.ok).count()
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Quote(args) => {
            let resolver = Arc::new(build_resolver(cli, None));
            quote::run(&args.tickers, resolver).await
        }
        Command::Parse(args) => {
            let resolver = build_resolver(cli, Some(Arc::new(NoopHttpClient)));
            parse::run(&args.tickers, &resolver)
        }
        Command::Exchanges => Ok(exchanges::run()),
    }
}

fn resolver_config(cli: &Cli) -> ResolverConfig {
    let mut config = ResolverConfig::from_env();
    if let Some(secs) = cli.cache_ttl_secs {
        config = config.with_cache_ttl(Duration::from_secs(secs));
    }
    if let Some(ms) = cli.deadline_ms {
        config = config.with_deadline(Duration::from_millis(ms));
    }
    config
}

fn build_resolver(cli: &Cli, http_client: Option<Arc<dyn HttpClient>>) -> QuoteResolver {
    let builder = QuoteResolverBuilder::new().with_config(resolver_config(cli));
    match http_client {
        Some(http_client) => builder.with_http_client(http_client),
        None => builder,
    }
    .build()
}

fn join_ids<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let joined = items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        String::from("-")
    } else {
        joined
    }
}
