// Recovery Cache: a single-slot durable side channel so a downstream step
// can re-hydrate the last-selected offer after a full reload. Last-write-wins
// and never authoritative; a recalled offer must be re-confirmed before use.

use crate::models::{FlightOffer, RecoveryRecord};
use dashmap::DashMap;
use std::sync::Arc;

/// Well-known slot names. A browser shell maps these onto session storage;
/// tests and the default wiring use the in-memory store.
pub const OFFER_SLOT: &str = "farelink.selected_offer";
pub const TRACE_SLOT: &str = "farelink.trace_id";

/// Narrow persistence seam. Backends may fail arbitrarily; the cache
/// swallows those failures into `None` reads.
pub trait RecoveryStore: Send + Sync {
    fn put(&self, key: &str, value: Vec<u8>) -> anyhow::Result<()>;
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

#[derive(Default)]
pub struct InMemoryRecoveryStore {
    slots: DashMap<String, Vec<u8>>,
}

impl InMemoryRecoveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for InMemoryRecoveryStore {
    fn put(&self, key: &str, value: Vec<u8>) -> anyhow::Result<()> {
        self.slots.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.slots.get(key).map(|entry| entry.value().clone()))
    }
}

pub struct RecoveryCache {
    store: Arc<dyn RecoveryStore>,
}

impl RecoveryCache {
    pub fn new(store: Arc<dyn RecoveryStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRecoveryStore::new()))
    }

    /// Overwrite both slots with the latest selection. Write failures are
    /// logged and swallowed: losing the recovery slot must never break the
    /// selection itself.
    pub fn remember(&self, offer: &FlightOffer, trace_id: &str) {
        let record = RecoveryRecord {
            offer: offer.clone(),
            saved_at: chrono::Utc::now(),
        };
        let encoded = match serde_json::to_vec(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode recovery record");
                return;
            }
        };
        if let Err(e) = self.store.put(OFFER_SLOT, encoded) {
            tracing::warn!(error = %e, "could not persist selected offer");
        }
        if let Err(e) = self.store.put(TRACE_SLOT, trace_id.as_bytes().to_vec()) {
            tracing::warn!(error = %e, "could not persist trace id");
        }
    }

    /// The most recently remembered offer, or `None` for a missing, corrupt
    /// or failing slot. Never errors.
    pub fn recall_offer(&self) -> Option<FlightOffer> {
        let bytes = match self.store.get(OFFER_SLOT) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "recovery store read failed");
                return None;
            }
        };
        match serde_json::from_slice::<RecoveryRecord>(&bytes) {
            Ok(record) => Some(record.offer),
            Err(e) => {
                tracing::warn!(error = %e, "corrupt recovery record ignored");
                None
            }
        }
    }

    pub fn recall_trace_id(&self) -> Option<String> {
        match self.store.get(TRACE_SLOT) {
            Ok(Some(bytes)) => String::from_utf8(bytes).ok().filter(|s| !s.is_empty()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "recovery store read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CabinClass;

    fn offer(id: &str) -> FlightOffer {
        FlightOffer {
            offer_id: id.to_string(),
            origin: "BOM".to_string(),
            destination: "DEL".to_string(),
            depart_time: "06:15".to_string(),
            arrive_time: "08:20".to_string(),
            depart_at: None,
            arrive_at: None,
            duration_minutes: 125,
            stop_count: 0,
            airline_code: "AI".to_string(),
            airline_name: "Air India".to_string(),
            flight_number: "441".to_string(),
            cabin: CabinClass::Economy,
            published_fare: 5200.0,
            currency: "INR".to_string(),
        }
    }

    #[test]
    fn empty_cache_recalls_none() {
        let cache = RecoveryCache::in_memory();
        assert!(cache.recall_offer().is_none());
        assert!(cache.recall_trace_id().is_none());
    }

    #[test]
    fn last_write_wins_single_slot() {
        let cache = RecoveryCache::in_memory();
        cache.remember(&offer("a"), "trace-1");
        cache.remember(&offer("b"), "trace-2");

        let recalled = cache.recall_offer().unwrap();
        assert_eq!(recalled.offer_id, "b");
        assert_eq!(cache.recall_trace_id().as_deref(), Some("trace-2"));
    }

    #[test]
    fn corrupt_slot_reads_as_none() {
        let store = Arc::new(InMemoryRecoveryStore::new());
        store.put(OFFER_SLOT, b"{not json".to_vec()).unwrap();
        let cache = RecoveryCache::new(store);
        assert!(cache.recall_offer().is_none());
    }

    #[test]
    fn failing_store_reads_as_none_never_panics() {
        struct BrokenStore;
        impl RecoveryStore for BrokenStore {
            fn put(&self, _key: &str, _value: Vec<u8>) -> anyhow::Result<()> {
                anyhow::bail!("storage quota exceeded")
            }
            fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
                anyhow::bail!("storage unavailable")
            }
        }

        let cache = RecoveryCache::new(Arc::new(BrokenStore));
        cache.remember(&offer("a"), "trace-1");
        assert!(cache.recall_offer().is_none());
        assert!(cache.recall_trace_id().is_none());
    }
}
