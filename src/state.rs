use crate::config::AppConfig;
use crate::errors::PersistenceWarning;
use crate::pricing::PricingClient;
use crate::session::{SessionHandle, SessionView, WriteReport};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

// ── Messages OUT to dashboard clients ──

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    #[serde(rename = "view_update")]
    ViewUpdate { view: SessionView },

    #[serde(rename = "persistence_warning")]
    PersistenceWarning { key: String, message: String },

    #[serde(rename = "pricing_failed")]
    PricingFailed { kind: String, reason: String },
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub records_added: AtomicU64,
    pub records_deleted: AtomicU64,
    pub undos_applied: AtomicU64,
    pub pricing_failures: AtomicU64,
    pub persistence_warnings: AtomicU64,
    pub completions_dropped: AtomicU64,
    pub notices_broadcast: AtomicU64,
    pub ws_messages_sent: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            records_added: AtomicU64::new(0),
            records_deleted: AtomicU64::new(0),
            undos_applied: AtomicU64::new(0),
            pricing_failures: AtomicU64::new(0),
            persistence_warnings: AtomicU64::new(0),
            completions_dropped: AtomicU64::new(0),
            notices_broadcast: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    pub session: SessionHandle,
    pub pricing: PricingClient,

    // Server -> Dashboard: notices (broadcast for WS clients).
    // View updates travel on the session's own watch channel.
    pub ws_tx: broadcast::Sender<WsMessage>,

    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, session: SessionHandle, pricing: PricingClient) -> Arc<Self> {
        let (ws_tx, _) = broadcast::channel(256);
        Arc::new(Self {
            config,
            session,
            pricing,
            ws_tx,
            counters: PerfCounters::new(),
        })
    }

    #[inline]
    pub fn broadcast(&self, msg: WsMessage) {
        PerfCounters::bump(&self.counters.notices_broadcast);
        let _ = self.ws_tx.send(msg);
    }

    /// Count and broadcast any write-through failures from a mutation.
    pub fn report_warnings(&self, report: &WriteReport) {
        for PersistenceWarning { key, message } in report.warnings.iter().cloned() {
            PerfCounters::bump(&self.counters.persistence_warnings);
            self.broadcast(WsMessage::PersistenceWarning {
                key: key.to_string(),
                message,
            });
        }
    }
}
