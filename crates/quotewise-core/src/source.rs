use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers reported as the `source` of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Alphavantage,
    Yahoo,
    Polygon,
    Nse,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [Self::Alphavantage, Self::Yahoo, Self::Polygon, Self::Nse];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alphavantage => "alphavantage",
            Self::Yahoo => "yahoo",
            Self::Polygon => "polygon",
            Self::Nse => "nse",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alphavantage" => Ok(Self::Alphavantage),
            "yahoo" => Ok(Self::Yahoo),
            "polygon" => Ok(Self::Polygon),
            "nse" => Ok(Self::Nse),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
