//! Pending authorization flows
//!
//! Every `/login` gets its own anti-forgery nonce, keyed by a random flow id
//! that the browser carries back in the `oauth_flow` cookie. A flow is
//! consumed by the first callback that presents it, whether or not the state
//! matches. At most [`MAX_PENDING_FLOWS`] are kept; the oldest go first.

use std::collections::{HashMap, VecDeque};

use oauth2::CsrfToken;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

/// Cookie carrying the flow id between `/login` and `/auth/callback`
pub const FLOW_COOKIE: &str = "oauth_flow";

/// How long a flow stays redeemable (matches the flow cookie Max-Age)
pub const FLOW_TTL_SECS: i64 = 600;

/// Upper bound on outstanding flows; the oldest is evicted beyond it
pub const MAX_PENDING_FLOWS: usize = 10_000;

struct PendingFlow {
    nonce: String,
    issued_at: OffsetDateTime,
}

#[derive(Default)]
struct FlowTable {
    flows: HashMap<String, PendingFlow>,
    /// Flow ids in issue order; may still hold ids already taken
    order: VecDeque<(String, OffsetDateTime)>,
}

pub struct PendingFlows {
    table: Mutex<FlowTable>,
    ttl: Duration,
    max_pending: usize,
}

impl Default for PendingFlows {
    fn default() -> Self {
        Self::new(Duration::seconds(FLOW_TTL_SECS), MAX_PENDING_FLOWS)
    }
}

impl PendingFlows {
    pub fn new(ttl: Duration, max_pending: usize) -> Self {
        Self {
            table: Mutex::new(FlowTable::default()),
            ttl,
            max_pending: max_pending.max(1),
        }
    }

    /// Register a new flow, returning `(flow_id, nonce)`
    pub async fn issue(&self) -> (String, String) {
        let flow_id = CsrfToken::new_random().secret().clone();
        let nonce = CsrfToken::new_random().secret().clone();
        let now = OffsetDateTime::now_utc();

        let mut guard = self.table.lock().await;
        let table = &mut *guard;

        // Issue order is expiry order, so only the front needs checking
        let mut purged = 0;
        while let Some((_, issued_at)) = table.order.front() {
            if now - *issued_at < self.ttl {
                break;
            }
            if let Some((id, _)) = table.order.pop_front() {
                if table.flows.remove(&id).is_some() {
                    purged += 1;
                }
            }
        }
        if purged > 0 {
            tracing::debug!(purged, "Purged expired authorization flows");
        }

        let mut evicted = 0;
        while table.order.len() >= self.max_pending {
            if let Some((id, _)) = table.order.pop_front() {
                if table.flows.remove(&id).is_some() {
                    evicted += 1;
                }
            }
        }
        if evicted > 0 {
            tracing::warn!(
                evicted,
                max_pending = self.max_pending,
                "Pending authorization flow limit reached, evicted oldest flows"
            );
        }

        table.order.push_back((flow_id.clone(), now));
        table.flows.insert(
            flow_id.clone(),
            PendingFlow {
                nonce: nonce.clone(),
                issued_at: now,
            },
        );

        (flow_id, nonce)
    }

    /// Remove the flow and return its nonce if it has not expired
    pub async fn take(&self, flow_id: &str) -> Option<String> {
        let flow = self.table.lock().await.flows.remove(flow_id)?;

        if OffsetDateTime::now_utc() - flow.issued_at >= self.ttl {
            tracing::debug!("Authorization flow expired");
            return None;
        }

        Some(flow.nonce)
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.flows.len()
    }
}
