use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Geographic grouping of the recognized exchange codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeRegion {
    UnitedStates,
    Europe,
    AsiaPacific,
    India,
    China,
}

impl ExchangeRegion {
    pub const ALL: [Self; 5] = [
        Self::UnitedStates,
        Self::Europe,
        Self::AsiaPacific,
        Self::India,
        Self::China,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnitedStates => "united_states",
            Self::Europe => "europe",
            Self::AsiaPacific => "asia_pacific",
            Self::India => "india",
            Self::China => "china",
        }
    }

    /// Exchange codes accepted as a ticker prefix for this region.
    pub const fn exchanges(self) -> &'static [&'static str] {
        match self {
            Self::UnitedStates => US_EXCHANGES,
            Self::Europe => EUROPE_EXCHANGES,
            Self::AsiaPacific => ASIA_PACIFIC_EXCHANGES,
            Self::India => INDIAN_EXCHANGES,
            Self::China => CHINESE_EXCHANGES,
        }
    }

    /// Looks up the region of an uppercase exchange code.
    pub fn of(exchange: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|region| region.exchanges().contains(&exchange))
    }
}

impl Display for ExchangeRegion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const US_EXCHANGES: &[&str] = &[
    "NASDAQ", "NYSE", "AMEX", "NYSEARCA", "NYSEAMERICAN", "ARCA", "BATS", "OTC",
];

const EUROPE_EXCHANGES: &[&str] = &[
    "LSE", "LON", "XETRA", "ETR", "FRA", "EPA", "AMS", "EBR", "SWX", "BME", "MIL", "STO", "CPH",
    "HEL", "OSL", "VIE", "ELI", "ISE", "WSE",
];

const ASIA_PACIFIC_EXCHANGES: &[&str] = &[
    "TSE", "TYO", "HKEX", "HKG", "ASX", "SGX", "KRX", "KOSDAQ", "TWSE", "TPE", "NZX", "SET",
    "IDX", "KLSE",
];

const INDIAN_EXCHANGES: &[&str] = &["NSE", "BSE", "MCX", "NCDEX", "ICEX"];

const CHINESE_EXCHANGES: &[&str] = &["SSE", "SZSE", "SHA", "SHE"];

/// Routing class derived from the exchange prefix of a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeClass {
    /// No exchange prefix was given.
    Unclassified,
    UsMajor,
    Indian,
    OtherInternational,
}

impl ExchangeClass {
    pub fn of(exchange: Option<&str>) -> Self {
        let Some(exchange) = exchange else {
            return Self::Unclassified;
        };

        match ExchangeRegion::of(exchange) {
            Some(ExchangeRegion::UnitedStates) => Self::UsMajor,
            Some(ExchangeRegion::India) => Self::Indian,
            Some(_) | None => Self::OtherInternational,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::UsMajor => "us_major",
            Self::Indian => "indian",
            Self::OtherInternational => "other_international",
        }
    }
}

impl Display for ExchangeClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_recognized_exchange(exchange: &str) -> bool {
    ExchangeRegion::of(exchange).is_some()
}

pub fn is_indian_exchange(exchange: &str) -> bool {
    INDIAN_EXCHANGES.contains(&exchange)
}

/// Market suffix used by Yahoo-style symbol lookups for Indian listings.
///
/// Only NSE and BSE have a suffix; the commodity exchanges are not quoted by
/// any upstream.
pub fn indian_market_suffix(exchange: &str) -> Option<&'static str> {
    match exchange {
        "NSE" => Some(".NS"),
        "BSE" => Some(".BO"),
        _ => None,
    }
}

/// Yahoo suffix for the non-Indian, non-US listings Yahoo can address.
pub fn yahoo_international_suffix(exchange: &str) -> Option<&'static str> {
    let suffix = match exchange {
        "LSE" | "LON" => ".L",
        "XETRA" | "ETR" => ".DE",
        "FRA" => ".F",
        "EPA" => ".PA",
        "AMS" => ".AS",
        "EBR" => ".BR",
        "SWX" => ".SW",
        "BME" => ".MC",
        "MIL" => ".MI",
        "STO" => ".ST",
        "CPH" => ".CO",
        "HEL" => ".HE",
        "OSL" => ".OL",
        "VIE" => ".VI",
        "ELI" => ".LS",
        "ISE" => ".IR",
        "WSE" => ".WA",
        "TSE" | "TYO" => ".T",
        "HKEX" | "HKG" => ".HK",
        "ASX" => ".AX",
        "SGX" => ".SI",
        "KRX" => ".KS",
        "KOSDAQ" => ".KQ",
        "TWSE" | "TPE" => ".TW",
        "NZX" => ".NZ",
        "SET" => ".BK",
        "IDX" => ".JK",
        "KLSE" => ".KL",
        "SSE" | "SHA" => ".SS",
        "SZSE" | "SHE" => ".SZ",
        _ => return None,
    };
    Some(suffix)
}
