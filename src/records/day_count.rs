use serde::{Deserialize, Serialize};

/// Day-count convention used to turn the maturity date into a year fraction.
/// Travels on the wire as its integer code (0..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayCountConvention {
    Thirty360,
    Thirty365,
    Actual360,
    Actual365,
    ActualActual,
}

impl DayCountConvention {
    pub const ALL: [DayCountConvention; 5] = [
        Self::Thirty360,
        Self::Thirty365,
        Self::Actual360,
        Self::Actual365,
        Self::ActualActual,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Self::Thirty360 => 0,
            Self::Thirty365 => 1,
            Self::Actual360 => 2,
            Self::Actual365 => 3,
            Self::ActualActual => 4,
        }
    }

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Thirty360 => "30/360",
            Self::Thirty365 => "30/365",
            Self::Actual360 => "Actual/360",
            Self::Actual365 => "Actual/365",
            Self::ActualActual => "Actual/Actual",
        }
    }
}

impl TryFrom<u8> for DayCountConvention {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| format!("invalid day count convention {code}, expected 0..=4"))
    }
}

impl From<DayCountConvention> for u8 {
    fn from(c: DayCountConvention) -> u8 {
        c.code()
    }
}

impl std::fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_wire_contract() {
        let labels: Vec<_> = (0u8..5)
            .map(|c| DayCountConvention::try_from(c).unwrap().label())
            .collect();
        assert_eq!(labels, ["30/360", "30/365", "Actual/360", "Actual/365", "Actual/Actual"]);
    }

    #[test]
    fn test_out_of_range_code_rejected() {
        assert!(DayCountConvention::try_from(5).is_err());
        assert!(serde_json::from_str::<DayCountConvention>("7").is_err());
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&DayCountConvention::Actual365).unwrap();
        assert_eq!(json, "3");
    }
}
