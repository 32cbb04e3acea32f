use std::sync::Arc;

use quotewise_core::{QuoteResolver, ResolutionTrace, ResolveResponse, ResponseBody};
use tokio::task::JoinSet;

use super::{join_ids, CommandResult, Payload, Row};
use crate::error::CliError;

const HEADERS: &[&str] = &["TICKER", "STATUS", "PRICE", "SOURCE", "CACHE", "TRIED", "LATENCY_MS"];

pub async fn run(
    tickers: &[String],
    resolver: Arc<QuoteResolver>,
) -> Result<CommandResult, CliError> {
    let mut tasks = JoinSet::new();
    for (index, raw) in tickers.iter().enumerate() {
        let resolver = Arc::clone(&resolver);
        let raw = raw.clone();
        tasks.spawn(async move {
            let trace = resolver.resolve_traced(&raw).await;
            (index, raw, trace)
        });
    }

    let mut traced = Vec::with_capacity(tickers.len());
    while let Some(joined) = tasks.join_next().await {
        let entry =
            joined.map_err(|error| CliError::Command(format!("quote task failed: {error}")))?;
        traced.push(entry);
    }
    traced.sort_by_key(|(index, _, _)| *index);

    let rows = traced
        .into_iter()
        .map(|(_, raw, trace)| to_row(&raw, trace))
        .collect();

    Ok(CommandResult {
        headers: HEADERS,
        rows,
    })
}

fn to_row(raw: &str, trace: ResolutionTrace) -> Row {
    let (ticker, price, source) = match &trace.outcome {
        Ok(quote) => (
            quote.ticker.clone(),
            format!("{:.2}", quote.price),
            quote.source.to_string(),
        ),
        Err(failure) if !failure.ticker.is_empty() => {
            (failure.ticker.clone(), String::from("-"), String::from("-"))
        }
        Err(_) => (raw.to_owned(), String::from("-"), String::from("-")),
    };

    let response = ResolveResponse::from(trace.outcome);
    let status = match &response.body {
        ResponseBody::Quote(_) => String::from("200"),
        ResponseBody::Error(body) => format!("{} {}", response.status, body.error),
    };

    Row {
        ok: response.is_success(),
        cells: vec![
            ticker,
            status,
            price,
            source,
            if trace.cache_hit { "hit" } else { "miss" }.to_owned(),
            join_ids(trace.attempted),
            trace.latency_ms.to_string(),
        ],
        payload: Payload::Response(response),
    }
}
