use super::store::{Deletion, SessionStore, WriteReport};
use crate::errors::{LedgerError, LedgerResult};
use crate::records::{BondRecord, RecordId};
use crate::view::{self, FieldTable};
use portable_atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

/// What a display layer needs after each mutation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SessionView {
    pub table: FieldTable,
    pub undo_available: bool,
}

impl SessionView {
    fn of(store: &SessionStore) -> Self {
        Self {
            table: view::project(store.records()),
            undo_available: store.snapshot_available(),
        }
    }
}

/// Outcome of an append. `undo_available` is read under the same lock as
/// the append itself.
#[must_use]
#[derive(Debug, Clone)]
pub struct Appended {
    pub report: WriteReport,
    pub undo_available: bool,
}

struct Shared {
    store: Mutex<SessionStore>,
    view_tx: watch::Sender<SessionView>,
    closed: AtomicBool,
}

/// Shared handle to the session store.
///
/// Every mutation runs under one mutex, so readers only ever observe the
/// sequence before or after a mutation. The projected view is republished
/// on a watch channel before the lock is released.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Shared>,
}

/// Non-owning handle held by in-flight pricing calls.
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<Shared>,
}

impl WeakSession {
    /// `None` once every `SessionHandle` has been dropped or the session
    /// has been closed.
    pub fn upgrade(&self) -> Option<SessionHandle> {
        self.inner
            .upgrade()
            .filter(|inner| !inner.closed.load(Ordering::Acquire))
            .map(|inner| SessionHandle { inner })
    }
}

impl SessionHandle {
    pub fn new(store: SessionStore) -> Self {
        let (view_tx, _) = watch::channel(SessionView::of(&store));
        Self {
            inner: Arc::new(Shared {
                store: Mutex::new(store),
                view_tx,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Discard the session for pricing calls still in flight. Handles that
    /// already exist keep working; only `WeakSession::upgrade` is refused.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.view_tx.subscribe()
    }

    /// Latest published view. Does not take the store lock.
    pub fn view(&self) -> SessionView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn records(&self) -> LedgerResult<Vec<BondRecord>> {
        Ok(self.lock()?.records().to_vec())
    }

    pub fn snapshot_available(&self) -> LedgerResult<bool> {
        Ok(self.lock()?.snapshot_available())
    }

    pub fn add(&self, record: BondRecord) -> LedgerResult<Appended> {
        self.mutate(|store| {
            store.add(record).map(|report| Appended {
                report,
                undo_available: store.snapshot_available(),
            })
        })?
    }

    pub fn delete(&self, id: &RecordId) -> LedgerResult<Deletion> {
        self.mutate(|store| store.delete(id))
    }

    pub fn undo(&self) -> LedgerResult<Option<WriteReport>> {
        self.mutate(|store| store.undo())
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, SessionStore>> {
        self.inner
            .store
            .lock()
            .map_err(|e| LedgerError::StateCorruption(format!("session lock poisoned: {e}")))
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> LedgerResult<R> {
        let mut store = self.lock()?;
        let out = f(&mut store);

        let next = SessionView::of(&store);
        self.inner.view_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::records::fixtures;

    fn handle() -> SessionHandle {
        SessionHandle::new(SessionStore::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn test_view_follows_mutations() {
        let session = handle();
        let rx = session.subscribe();
        assert!(rx.borrow().table.is_empty());

        let rec = fixtures::binomial(97.32, 95.10);
        let _ = session.add(rec.clone()).unwrap();
        assert_eq!(session.view().table.id, vec![rec.id]);
        assert!(!session.view().undo_available);

        let _ = session.delete(&rec.id).unwrap();
        let view = rx.borrow().clone();
        assert!(view.table.is_empty());
        assert!(view.undo_available);

        let _ = session.undo().unwrap().unwrap();
        assert_eq!(session.view().table.len(), 1);
        assert_eq!(session.records().unwrap(), vec![rec]);
    }

    #[tokio::test]
    async fn test_unchanged_store_does_not_notify() {
        let session = handle();
        let mut rx = session.subscribe();
        rx.mark_unchanged();

        assert!(session.undo().unwrap().is_none());
        assert!(!rx.has_changed().unwrap());

        let _ = session.add(fixtures::binomial(97.32, 95.10)).unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_duplicate_add_surfaces_precondition() {
        let session = handle();
        let rec = fixtures::ho_lee(11.0);
        let _ = session.add(rec.clone()).unwrap();
        assert!(matches!(session.add(rec), Err(LedgerError::Precondition(_))));
        assert_eq!(session.view().table.len(), 1);
    }

    #[test]
    fn test_add_reports_undo_slot_from_same_mutation() {
        let session = handle();
        let first = fixtures::binomial(97.32, 95.10);
        assert!(!session.add(first.clone()).unwrap().undo_available);

        let _ = session.delete(&first.id).unwrap();
        let appended = session.add(fixtures::ho_lee(12.0)).unwrap();
        assert!(appended.undo_available);
        assert!(appended.report.is_clean());
    }

    #[test]
    fn test_weak_session_dies_with_last_handle() {
        let session = handle();
        let weak = session.downgrade();
        assert!(weak.upgrade().is_some());
        drop(session);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_closed_session_refuses_upgrade() {
        let session = handle();
        let weak = session.downgrade();
        session.close();
        assert!(weak.upgrade().is_none());

        let _ = session.add(fixtures::binomial(97.32, 95.10)).unwrap();
        assert_eq!(session.records().unwrap().len(), 1);
    }
}
