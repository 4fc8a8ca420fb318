//! Columnar projection of the record log for tabular display.
//! Pure: the table is derived from the records passed in and nothing else.

use crate::records::{BondModel, BondRecord, DayCountConvention, RecordId};
use chrono::{DateTime, Local, NaiveDate};

/// One column per field, all the same length and order as the records.
/// `None` marks a field that does not apply to that record's model,
/// which is distinct from a genuine zero.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FieldTable {
    pub id: Vec<RecordId>,
    pub model: Vec<&'static str>,
    pub created_at: Vec<DateTime<Local>>,

    // Binomial
    pub r0: Vec<Option<f64>>,
    pub u: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
    pub n: Vec<Option<u32>>,
    pub q: Vec<Option<f64>>,
    pub straight_bond_price: Vec<Option<f64>>,

    // Ho-Lee
    pub k: Vec<Option<f64>>,
    pub maturity_date: Vec<Option<NaiveDate>>,
    pub delta: Vec<Option<f64>>,
    pub pi: Vec<Option<f64>>,
    pub coupon_rate: Vec<Option<f64>>,
    pub face_value: Vec<Option<f64>>,
    pub day_count_convention: Vec<Option<DayCountConvention>>,
    pub term_structure_points: Vec<Option<usize>>,

    // Shared
    pub callable_bond_price: Vec<Option<f64>>,
}

impl FieldTable {
    fn with_capacity(n: usize) -> Self {
        Self {
            id: Vec::with_capacity(n),
            model: Vec::with_capacity(n),
            created_at: Vec::with_capacity(n),
            r0: Vec::with_capacity(n),
            u: Vec::with_capacity(n),
            d: Vec::with_capacity(n),
            n: Vec::with_capacity(n),
            q: Vec::with_capacity(n),
            straight_bond_price: Vec::with_capacity(n),
            k: Vec::with_capacity(n),
            maturity_date: Vec::with_capacity(n),
            delta: Vec::with_capacity(n),
            pi: Vec::with_capacity(n),
            coupon_rate: Vec::with_capacity(n),
            face_value: Vec::with_capacity(n),
            day_count_convention: Vec::with_capacity(n),
            term_structure_points: Vec::with_capacity(n),
            callable_bond_price: Vec::with_capacity(n),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    fn push(&mut self, rec: &BondRecord) {
        self.id.push(rec.id);
        self.model.push(rec.model.tag());
        self.created_at.push(rec.created_at);

        match &rec.model {
            BondModel::Binomial(t) => {
                self.r0.push(Some(t.r0));
                self.u.push(Some(t.u));
                self.d.push(Some(t.d));
                self.n.push(Some(t.n));
                self.q.push(Some(t.q));
                self.straight_bond_price.push(Some(t.straight_bond_price));

                self.k.push(None);
                self.maturity_date.push(None);
                self.delta.push(None);
                self.pi.push(None);
                self.coupon_rate.push(None);
                self.face_value.push(None);
                self.day_count_convention.push(None);
                self.term_structure_points.push(None);

                self.callable_bond_price.push(Some(t.callable_bond_price));
            }
            BondModel::HoLee(t) => {
                self.r0.push(None);
                self.u.push(None);
                self.d.push(None);
                self.n.push(None);
                self.q.push(None);
                self.straight_bond_price.push(None);

                self.k.push(Some(t.k));
                self.maturity_date.push(Some(t.maturity_date));
                self.delta.push(Some(t.delta));
                self.pi.push(Some(t.pi));
                self.coupon_rate.push(Some(t.coupon_rate));
                self.face_value.push(Some(t.face_value));
                self.day_count_convention.push(Some(t.day_count_convention));
                self.term_structure_points
                    .push(t.term_structure.as_ref().map(Vec::len));

                self.callable_bond_price.push(Some(t.callable_bond_price));
            }
        }
    }
}

/// Project records into columns. Order and length follow `records`.
pub fn project(records: &[BondRecord]) -> FieldTable {
    let mut table = FieldTable::with_capacity(records.len());
    for rec in records {
        table.push(rec);
    }
    table
}
