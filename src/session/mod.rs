pub mod handle;
pub mod store;

pub use handle::{Appended, SessionHandle, SessionView, WeakSession};
pub use store::{Deletion, SessionStore, WriteReport};

use crate::errors::{LedgerError, LedgerResult};
use crate::pricing::{PricingRequest, PricingService};
use crate::records::BondRecord;

/// A priced record that made it into the session.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub record: BondRecord,
    pub report: WriteReport,
    /// Undo availability right after this append.
    pub undo_available: bool,
}

/// Validate, price, then append on completion.
///
/// Only a weak reference to the session is held across the pricing call.
/// If the session has been dropped by the time the quote arrives the
/// result is discarded. Concurrent calls append in completion order.
pub async fn price_and_record<S: PricingService>(
    service: &S,
    session: WeakSession,
    request: PricingRequest,
) -> LedgerResult<Recorded> {
    request.validate()?;

    let kind = request.kind();
    let quote = service.price(&request).await.map_err(|e| {
        tracing::warn!(kind, error = %e, "pricing request failed");
        LedgerError::Pricing(e)
    })?;

    let record = request.into_record(quote)?;

    let Some(session) = session.upgrade() else {
        tracing::debug!(kind, id = %record.id, "session discarded, dropping completed quote");
        return Err(LedgerError::SessionClosed);
    };

    let Appended { report, undo_available } = session.add(record.clone()).inspect_err(|e| {
        tracing::error!(id = %record.id, error = %e, "record rejected by session");
    })?;

    tracing::info!(
        kind,
        id = %record.id,
        callable_bond_price = record.callable_bond_price(),
        persisted = report.is_clean(),
        "record added"
    );

    Ok(Recorded {
        record,
        report,
        undo_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PricingFailure;
    use crate::persistence::MemoryStore;
    use crate::pricing::types::{fixtures, BinomialQuote, BinomialRequest};
    use crate::pricing::PricingQuote;
    use crate::records::BondModel;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    fn session() -> SessionHandle {
        SessionHandle::new(SessionStore::new(Arc::new(MemoryStore::new())))
    }

    fn binomial(r0: f64) -> PricingRequest {
        PricingRequest::Binomial(BinomialRequest { r0, ..fixtures::binomial() })
    }

    /// Returns a fixed quote, or a fixed failure.
    struct Fixed(Result<PricingQuote, PricingFailure>);

    impl PricingService for Fixed {
        async fn price(&self, _request: &PricingRequest) -> Result<PricingQuote, PricingFailure> {
            self.0.clone()
        }
    }

    /// Each request waits until its gate (keyed by the basis points of r0)
    /// is released. The straight price echoes r0 so results are traceable.
    #[derive(Default)]
    struct Gated {
        gates: Mutex<HashMap<u32, oneshot::Receiver<()>>>,
    }

    impl Gated {
        fn gate(&self, r0: f64) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(bps(r0), rx);
            tx
        }
    }

    fn bps(r0: f64) -> u32 {
        (r0 * 10_000.0).round() as u32
    }

    impl PricingService for Gated {
        async fn price(&self, request: &PricingRequest) -> Result<PricingQuote, PricingFailure> {
            let PricingRequest::Binomial(req) = request else {
                return Err(PricingFailure::Malformed("binomial only".into()));
            };
            let gate = {
                let mut gates = self.gates.lock().unwrap();
                gates.remove(&bps(req.r0))
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(PricingQuote::Binomial(BinomialQuote {
                straight_bond_price: req.r0 * 1000.0,
                callable_bond_price: 90.0,
            }))
        }
    }

    #[tokio::test]
    async fn test_success_appends_record() {
        let session = session();
        let service = Fixed(Ok(PricingQuote::Binomial(BinomialQuote {
            straight_bond_price: 97.32,
            callable_bond_price: 95.10,
        })));

        let recorded = price_and_record(&service, session.downgrade(), binomial(0.06))
            .await
            .unwrap();
        assert!(recorded.report.is_clean());
        assert!(!recorded.undo_available);
        assert_eq!(session.records().unwrap(), vec![recorded.record.clone()]);
        assert!(!session.snapshot_available().unwrap());
        match recorded.record.model {
            BondModel::Binomial(t) => {
                assert_eq!(t.straight_bond_price, 97.32);
                assert_eq!(t.callable_bond_price, 95.10);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pricing_failure_creates_nothing() {
        let session = session();
        let service = Fixed(Err(PricingFailure::Rejected { status: 502, body: "down".into() }));

        let err = price_and_record(&service, session.downgrade(), binomial(0.06))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Pricing(PricingFailure::Rejected { status: 502, .. })));
        assert!(session.records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_never_priced() {
        let session = session();
        let service = Fixed(Err(PricingFailure::Unreachable("should not be called".into())));

        let err = price_and_record(&service, session.downgrade(), binomial(1.5))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_appends_in_completion_order() {
        let session = session();
        let service = Arc::new(Gated::default());
        let release_first = service.gate(0.01);
        let release_second = service.gate(0.02);

        let first = tokio::spawn({
            let (svc, weak) = (service.clone(), session.downgrade());
            async move { price_and_record(&*svc, weak, binomial(0.01)).await }
        });
        let second = tokio::spawn({
            let (svc, weak) = (service.clone(), session.downgrade());
            async move { price_and_record(&*svc, weak, binomial(0.02)).await }
        });

        release_second.send(()).unwrap();
        let second = second.await.unwrap().unwrap();
        release_first.send(()).unwrap();
        let first = first.await.unwrap().unwrap();

        let ids: Vec<_> = session.records().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.record.id, first.record.id]);
    }

    #[tokio::test]
    async fn test_completion_after_discard_is_dropped() {
        let session = session();
        let weak = session.downgrade();
        let service = Arc::new(Gated::default());
        let release = service.gate(0.03);

        let pending = tokio::spawn({
            let svc = service.clone();
            async move { price_and_record(&*svc, weak, binomial(0.03)).await }
        });

        drop(session);
        release.send(()).unwrap();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, LedgerError::SessionClosed));
    }
}
