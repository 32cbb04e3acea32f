use quotewise_core::{
    indian_market_suffix, yahoo_international_suffix, ExchangeClass, ExchangeRegion,
};
use serde_json::json;

use super::{CommandResult, Payload, Row};

const HEADERS: &[&str] = &["EXCHANGE", "REGION", "CLASS", "YAHOO_SUFFIX"];

pub fn run() -> CommandResult {
    let rows = ExchangeRegion::ALL
        .into_iter()
        .flat_map(|region| region.exchanges().iter().map(move |code| (region, *code)))
        .map(|(region, code)| {
            let class = ExchangeClass::of(Some(code));
            let suffix = indian_market_suffix(code).or_else(|| yahoo_international_suffix(code));
            Row {
                cells: vec![
                    code.to_owned(),
                    region.to_string(),
                    class.to_string(),
                    suffix.unwrap_or("-").to_owned(),
                ],
                payload: Payload::Value(json!({
                    "exchange": code,
                    "region": region,
                    "class": class,
                    "yahooSuffix": suffix,
                })),
                ok: true,
            }
        })
        .collect();

    CommandResult {
        headers: HEADERS,
        rows,
    }
}
