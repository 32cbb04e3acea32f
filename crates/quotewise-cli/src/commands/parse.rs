use quotewise_core::{ExchangeRegion, QuoteResolver, TickerIdentifier};
use serde_json::json;

use super::{join_ids, CommandResult, Payload, Row};
use crate::error::CliError;

const HEADERS: &[&str] = &["INPUT", "CANONICAL", "CLASS", "REGION", "ROUTE", "ERROR"];

pub fn run(tickers: &[String], resolver: &QuoteResolver) -> Result<CommandResult, CliError> {
    let rows = tickers
        .iter()
        .map(|raw| match TickerIdentifier::parse(raw) {
            Ok(ticker) => {
                let region = ticker.exchange().and_then(ExchangeRegion::of);
                let route = resolver.route(&ticker);
                let value = json!({
                    "input": raw,
                    "valid": true,
                    "ticker": ticker.canonical_form(),
                    "symbol": ticker.symbol(),
                    "exchange": ticker.exchange(),
                    "class": ticker.class(),
                    "region": region,
                    "route": route,
                });
                Row {
                    cells: vec![
                        raw.clone(),
                        ticker.canonical_form().to_owned(),
                        ticker.class().to_string(),
                        region.map_or_else(|| String::from("-"), |r| r.to_string()),
                        join_ids(route),
                        String::from("-"),
                    ],
                    payload: Payload::Value(value),
                    ok: true,
                }
            }
            Err(error) => Row {
                cells: vec![
                    raw.clone(),
                    String::from("-"),
                    String::from("-"),
                    String::from("-"),
                    String::from("-"),
                    error.to_string(),
                ],
                payload: Payload::Value(json!({
                    "input": raw,
                    "valid": false,
                    "error": error.to_string(),
                })),
                ok: false,
            },
        })
        .collect();

    Ok(CommandResult {
        headers: HEADERS,
        rows,
    })
}
