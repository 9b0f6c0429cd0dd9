use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::lenient_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Country {
    Russia,
    Kazakhstan,
    Kyrgyzstan,
    Uzbekistan,
}

impl Country {
    pub const ALL: [Country; 4] = [
        Country::Russia,
        Country::Kazakhstan,
        Country::Kyrgyzstan,
        Country::Uzbekistan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Russia => "Russia",
            Self::Kazakhstan => "Kazakhstan",
            Self::Kyrgyzstan => "Kyrgyzstan",
            Self::Uzbekistan => "Uzbekistan",
        }
    }

    /// International dialling prefix.
    pub fn dialling_code(self) -> &'static str {
        match self {
            Self::Russia | Self::Kazakhstan => "+7",
            Self::Kyrgyzstan => "+996",
            Self::Uzbekistan => "+998",
        }
    }

    /// Subscriber digits following the dialling code.
    pub fn phone_digits(self) -> usize {
        match self {
            Self::Kyrgyzstan | Self::Uzbekistan => 9,
            Self::Russia | Self::Kazakhstan => 10,
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("Country must be one of {}", valid.join(", "))
            })
    }
}

/// Name and address as produced by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsigneeIdentity {
    #[serde(deserialize_with = "lenient_text")]
    pub consignee_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub consignee_address: Option<String>,
}

/// Synthetic consignee record with locally generated identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsigneeRecord {
    pub consignee_name: String,
    pub consignee_address: String,
    pub consignee_iin: String,
    pub consignee_tel: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_round_trip() {
        for country in Country::ALL {
            assert_eq!(country.as_str().parse::<Country>(), Ok(country));
        }
    }

    #[test]
    fn test_unknown_country() {
        let err = "Tajikistan".parse::<Country>().unwrap_err();
        assert_eq!(
            err,
            "Country must be one of Russia, Kazakhstan, Kyrgyzstan, Uzbekistan"
        );
    }

    #[test]
    fn test_country_serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&Country::Kyrgyzstan).unwrap(),
            "\"Kyrgyzstan\""
        );
    }
}
