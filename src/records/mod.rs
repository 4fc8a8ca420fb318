pub mod day_count;
pub mod term_structure;

pub use day_count::DayCountConvention;
pub use term_structure::TermPoint;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Opaque record identifier. Assigned once by [`BondRecord::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// One completed pricing calculation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    pub id: RecordId,
    pub model: BondModel,
    pub created_at: DateTime<Local>,
}

impl BondRecord {
    /// Record factory: fresh id, local creation time.
    pub fn new(model: BondModel) -> Self {
        Self {
            id: RecordId::generate(),
            model,
            created_at: Local::now(),
        }
    }

    #[inline]
    pub fn callable_bond_price(&self) -> f64 {
        match &self.model {
            BondModel::Binomial(t) => t.callable_bond_price,
            BondModel::HoLee(t) => t.callable_bond_price,
        }
    }
}

/// Pricing variant with its inputs and service results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BondModel {
    Binomial(BinomialTerms),
    HoLee(HoLeeTerms),
}

impl BondModel {
    #[inline]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Binomial(_) => "binomial",
            Self::HoLee(_) => "ho_lee",
        }
    }
}

/// Short-rate binomial tree inputs and prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinomialTerms {
    pub r0: f64,
    pub u: f64,
    pub d: f64,
    pub n: u32,
    pub q: f64,
    pub straight_bond_price: f64,
    pub callable_bond_price: f64,
}

/// Ho-Lee term-structure inputs and price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoLeeTerms {
    pub k: f64,
    pub maturity_date: NaiveDate,
    pub delta: f64,
    pub pi: f64,
    pub coupon_rate: f64,
    pub face_value: f64,
    pub day_count_convention: DayCountConvention,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_structure: Option<Vec<TermPoint>>,
    pub callable_bond_price: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn binomial(straight: f64, callable: f64) -> BondRecord {
        BondRecord::new(BondModel::Binomial(BinomialTerms {
            r0: 0.06,
            u: 1.2,
            d: 0.9,
            n: 10,
            q: 0.5,
            straight_bond_price: straight,
            callable_bond_price: callable,
        }))
    }

    pub fn ho_lee(callable: f64) -> BondRecord {
        BondRecord::new(BondModel::HoLee(HoLeeTerms {
            k: 80.0,
            maturity_date: NaiveDate::from_ymd_opt(2030, 8, 8).unwrap(),
            delta: 0.98,
            pi: 0.5,
            coupon_rate: 0.05,
            face_value: 100.0,
            day_count_convention: DayCountConvention::Actual365,
            term_structure: Some(vec![TermPoint { time_to_maturity: 1.0, price: 0.025 }]),
            callable_bond_price: callable,
        }))
    }
}
