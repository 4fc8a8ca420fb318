use crate::errors::{LedgerError, LedgerResult, PersistenceError, PersistenceWarning};
use crate::persistence::PersistenceAdapter;
use crate::records::{BondRecord, RecordId};
use smallvec::SmallVec;
use std::sync::Arc;

/// Key holding the current record sequence.
pub const DATA_KEY: &str = "data";
/// Key holding the pre-deletion snapshot.
pub const LAST_STATE_KEY: &str = "lastState";

/// Persistence outcome of one mutation. Empty when every write landed.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    pub warnings: SmallVec<[PersistenceWarning; 2]>,
}

impl WriteReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Result of `delete`. `removed` is `None` when no record had the id.
#[must_use]
#[derive(Debug, Clone)]
pub struct Deletion {
    pub removed: Option<BondRecord>,
    pub report: WriteReport,
}

/// Ordered record log with a single sticky undo slot.
///
/// Every mutation writes through to the persistence adapter. A failed write
/// never rolls back the in-memory change; it comes back as a warning.
pub struct SessionStore {
    records: Vec<BondRecord>,
    snapshot: Option<Vec<BondRecord>>,
    persistence: Arc<dyn PersistenceAdapter>,
}

impl SessionStore {
    /// Empty store. Nothing is read from or written to `persistence` yet.
    pub fn new(persistence: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            records: Vec::new(),
            snapshot: None,
            persistence,
        }
    }

    /// Rebuild the store from `data` and `lastState`. Absent keys mean an
    /// empty log and no undo slot.
    pub fn load_persisted(persistence: Arc<dyn PersistenceAdapter>) -> LedgerResult<Self> {
        let records = read_sequence(persistence.as_ref(), DATA_KEY)?.unwrap_or_default();
        let snapshot = read_sequence(persistence.as_ref(), LAST_STATE_KEY)?;

        tracing::info!(
            records = records.len(),
            undo_available = snapshot.is_some(),
            "session loaded from storage"
        );

        Ok(Self {
            records,
            snapshot,
            persistence,
        })
    }

    #[inline]
    pub fn records(&self) -> &[BondRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn snapshot_available(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Append a priced record. A duplicate id is a caller defect: the store
    /// is left untouched and nothing is written.
    pub fn add(&mut self, record: BondRecord) -> LedgerResult<WriteReport> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(LedgerError::Precondition(format!(
                "record {} is already in the session",
                record.id
            )));
        }

        self.records.push(record);

        let mut report = WriteReport::default();
        self.persist_records(&mut report);
        Ok(report)
    }

    /// Snapshot the whole sequence into the undo slot, then remove the first
    /// record with `id`. The snapshot is taken even when nothing matches.
    pub fn delete(&mut self, id: &RecordId) -> Deletion {
        let mut report = WriteReport::default();

        self.snapshot = Some(self.records.clone());
        self.persist_snapshot(&mut report);

        let removed = self
            .records
            .iter()
            .position(|r| r.id == *id)
            .map(|idx| self.records.remove(idx));

        self.persist_records(&mut report);
        Deletion { removed, report }
    }

    /// Restore the last pre-deletion snapshot. Returns `None` (and changes
    /// nothing) when no deletion has happened. The slot is not consumed.
    pub fn undo(&mut self) -> Option<WriteReport> {
        let snapshot = self.snapshot.as_ref()?;
        self.records = snapshot.clone();

        let mut report = WriteReport::default();
        self.persist_records(&mut report);
        Some(report)
    }

    fn persist_records(&self, report: &mut WriteReport) {
        write_sequence(self.persistence.as_ref(), DATA_KEY, &self.records, report);
    }

    fn persist_snapshot(&self, report: &mut WriteReport) {
        if let Some(snapshot) = &self.snapshot {
            write_sequence(self.persistence.as_ref(), LAST_STATE_KEY, snapshot, report);
        }
    }
}

fn read_sequence(
    persistence: &dyn PersistenceAdapter,
    key: &'static str,
) -> LedgerResult<Option<Vec<BondRecord>>> {
    let raw = persistence
        .get(key)
        .map_err(|e| LedgerError::Database(format!("read {key}: {e}")))?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let records: Vec<BondRecord> =
        serde_json::from_str(&raw).map_err(|e| LedgerError::Parse(format!("{key}: {e}")))?;

    for (i, rec) in records.iter().enumerate() {
        if records[..i].iter().any(|r| r.id == rec.id) {
            return Err(LedgerError::Precondition(format!(
                "{key}: duplicate record id {}",
                rec.id
            )));
        }
    }

    Ok(Some(records))
}

fn write_sequence(
    persistence: &dyn PersistenceAdapter,
    key: &'static str,
    records: &[BondRecord],
    report: &mut WriteReport,
) {
    let result = serde_json::to_string(records)
        .map_err(|e| PersistenceError::Serialize(e.to_string()))
        .and_then(|json| persistence.set(key, &json));

    if let Err(e) = result {
        tracing::warn!(key, error = %e, records = records.len(), "write-through failed");
        report.warnings.push(PersistenceWarning::new(key, &e));
    }
}
