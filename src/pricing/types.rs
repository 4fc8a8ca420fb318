use crate::errors::{LedgerError, LedgerResult, PricingFailure};
use crate::records::term_structure::{self, TermPoint};
use crate::records::{BinomialTerms, BondModel, BondRecord, DayCountConvention, HoLeeTerms};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Requests ──

/// Binomial short-rate tree request. Wire body for `POST /calculate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialRequest {
    pub r0: f64,
    pub u: f64,
    pub d: f64,
    pub n: u32,
    pub q: f64,
}

impl BinomialRequest {
    /// Range checks matching the input form. Runs before any network call.
    pub fn validate(&self) -> LedgerResult<()> {
        check_range("r0", self.r0, 0.0, 1.0)?;
        check_range("u", self.u, 1.0, 2.0)?;
        check_range("d", self.d, 0.0, 1.0)?;
        check_range("q", self.q, 0.0, 1.0)?;
        if !(1..=365).contains(&self.n) {
            return Err(LedgerError::Validation(format!("n must be in [1, 365], got {}", self.n)));
        }
        Ok(())
    }
}

/// Ho-Lee JSON part of the multipart submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoLeeParams {
    pub k: f64,
    pub maturity_date: NaiveDate,
    pub delta: f64,
    pub pi: f64,
    pub coupon_rate: f64,
    pub face_value: f64,
    pub day_count_convention: DayCountConvention,
}

impl HoLeeParams {
    pub fn validate(&self) -> LedgerResult<()> {
        check_finite("k", self.k)?;
        if self.k < 0.0 {
            return Err(LedgerError::Validation("k must be >= 0".into()));
        }
        check_finite("delta", self.delta)?;
        if self.delta <= 0.0 || self.delta > 1.0 {
            return Err(LedgerError::Validation(format!(
                "delta must be in (0, 1], got {}",
                self.delta
            )));
        }
        check_range("pi", self.pi, 0.0, 1.0)?;
        check_finite("coupon_rate", self.coupon_rate)?;
        if self.coupon_rate < 0.0 {
            return Err(LedgerError::Validation("coupon_rate must be >= 0".into()));
        }
        check_finite("face_value", self.face_value)?;
        if self.face_value <= 0.0 {
            return Err(LedgerError::Validation("face_value must be > 0".into()));
        }
        Ok(())
    }
}

/// Uploaded term-structure file. The raw bytes go to the pricing service
/// untouched; the parsed points are kept on the record.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStructureUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub points: Vec<TermPoint>,
}

impl TermStructureUpload {
    pub fn parse(file_name: impl Into<String>, content: Vec<u8>) -> LedgerResult<Self> {
        let points = term_structure::parse_points(&content)?;
        Ok(Self {
            file_name: file_name.into(),
            content,
            points,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoLeeRequest {
    pub params: HoLeeParams,
    pub term_structure: Option<TermStructureUpload>,
}

/// One pricing submission, tagged by model.
#[derive(Debug, Clone, PartialEq)]
pub enum PricingRequest {
    Binomial(BinomialRequest),
    HoLee(HoLeeRequest),
}

impl PricingRequest {
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Binomial(_) => "binomial",
            Self::HoLee(_) => "ho_lee",
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        match self {
            Self::Binomial(r) => r.validate(),
            Self::HoLee(r) => r.params.validate(),
        }
    }

    /// Record factory input: pair the request with the service's quote.
    /// Prices are copied as returned, never recomputed.
    pub fn into_record(self, quote: PricingQuote) -> Result<BondRecord, PricingFailure> {
        let model = match (self, quote) {
            (Self::Binomial(req), PricingQuote::Binomial(q)) => BondModel::Binomial(BinomialTerms {
                r0: req.r0,
                u: req.u,
                d: req.d,
                n: req.n,
                q: req.q,
                straight_bond_price: q.straight_bond_price,
                callable_bond_price: q.callable_bond_price,
            }),
            (Self::HoLee(req), PricingQuote::HoLee(q)) => {
                let p = req.params;
                BondModel::HoLee(HoLeeTerms {
                    k: p.k,
                    maturity_date: p.maturity_date,
                    delta: p.delta,
                    pi: p.pi,
                    coupon_rate: p.coupon_rate,
                    face_value: p.face_value,
                    day_count_convention: p.day_count_convention,
                    term_structure: req.term_structure.map(|ts| ts.points),
                    callable_bond_price: q.callable_bond_price,
                })
            }
            (req, _) => {
                return Err(PricingFailure::Malformed(format!(
                    "quote does not match {} request",
                    req.kind()
                )))
            }
        };
        Ok(BondRecord::new(model))
    }
}

// ── Responses ──

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialQuote {
    pub straight_bond_price: f64,
    pub callable_bond_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoLeeQuote {
    pub callable_bond_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PricingQuote {
    Binomial(BinomialQuote),
    HoLee(HoLeeQuote),
}

#[inline]
fn check_finite(name: &str, v: f64) -> LedgerResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!("{name} must be finite")))
    }
}

#[inline]
fn check_range(name: &str, v: f64, lo: f64, hi: f64) -> LedgerResult<()> {
    check_finite(name, v)?;
    if v < lo || v > hi {
        return Err(LedgerError::Validation(format!("{name} must be in [{lo}, {hi}], got {v}")));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial_validation() {
        assert!(fixtures::binomial().validate().is_ok());

        let mut bad = fixtures::binomial();
        bad.u = 0.9;
        assert!(matches!(bad.validate(), Err(LedgerError::Validation(_))));

        let mut bad = fixtures::binomial();
        bad.n = 0;
        assert!(bad.validate().is_err());

        let mut bad = fixtures::binomial();
        bad.q = f64::NAN;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_ho_lee_validation() {
        assert!(fixtures::ho_lee_params().validate().is_ok());

        let mut bad = fixtures::ho_lee_params();
        bad.delta = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = fixtures::ho_lee_params();
        bad.face_value = -100.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_ho_lee_wire_shape() {
        let json = serde_json::to_value(fixtures::ho_lee_params()).unwrap();
        assert_eq!(json["maturity_date"], "2030-08-08");
        assert_eq!(json["day_count_convention"], 0);
    }

    #[test]
    fn test_into_record_copies_quote_verbatim() {
        let quote = PricingQuote::Binomial(BinomialQuote {
            straight_bond_price: 97.32,
            callable_bond_price: 95.10,
        });
        let rec = PricingRequest::Binomial(fixtures::binomial()).into_record(quote).unwrap();
        match rec.model {
            BondModel::Binomial(t) => {
                assert_eq!(t.straight_bond_price, 97.32);
                assert_eq!(t.callable_bond_price, 95.10);
                assert_eq!(t.n, 10);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_into_record_keeps_term_structure_points() {
        let upload = TermStructureUpload::parse("curve.csv", b"t,p\n1,0.02\n2,0.021\n".to_vec()).unwrap();
        let req = PricingRequest::HoLee(HoLeeRequest {
            params: fixtures::ho_lee_params(),
            term_structure: Some(upload),
        });
        let rec = req
            .into_record(PricingQuote::HoLee(HoLeeQuote { callable_bond_price: 12.5 }))
            .unwrap();
        match rec.model {
            BondModel::HoLee(t) => {
                assert_eq!(t.term_structure.map(|p| p.len()), Some(2));
                assert_eq!(t.callable_bond_price, 12.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_quote_is_malformed() {
        let req = PricingRequest::Binomial(fixtures::binomial());
        let err = req
            .into_record(PricingQuote::HoLee(HoLeeQuote { callable_bond_price: 1.0 }))
            .unwrap_err();
        assert!(matches!(err, PricingFailure::Malformed(_)));
    }
}
