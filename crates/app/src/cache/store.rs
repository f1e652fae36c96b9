//! Address cache with lazy expiry and geocode coalescing.

use std::time::Duration;

use entrega::{address::NormalizedAddress, decision::DeliveryDecision, geo::Coordinates};
use jiff::{SignedDuration, Timestamp};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::{geocode::Geocoder, tenants::TenantId};

/// Default validity window for cached geocode results: 30 days.
pub const DEFAULT_TTL: SignedDuration = SignedDuration::from_hours(30 * 24);

/// `None` while the leader's geocode is outstanding, then the shared outcome.
/// The inner `None` is a geocode failure, shared with waiters but not cached.
type SharedOutcome = Option<Option<Coordinates>>;

type InflightKey = (TenantId, NormalizedAddress);

/// A cached resolution for one normalized address.
///
/// Entries are written whole and overwritten whole, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Geocoded coordinates for the address.
    pub coordinates: Coordinates,
    /// Decision computed from the coordinates at resolution time.
    pub decision: DeliveryDecision,
    /// When the geocode was performed.
    pub resolved_at: Timestamp,
}

impl CacheEntry {
    /// Whether the entry is still valid at `now` for the given TTL.
    #[must_use]
    pub fn is_fresh(&self, now: Timestamp, ttl: SignedDuration) -> bool {
        now.duration_since(self.resolved_at) < ttl
    }
}

/// Cache occupancy for one tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently stored, fresh or expired.
    pub total: usize,
    /// Stored entries past the TTL, awaiting purge or overwrite.
    pub expired: usize,
}

/// Per-tenant cache of geocoded addresses and the decisions computed from
/// them.
///
/// Expiry is lazy: an expired entry behaves exactly like absence on reads
/// and is only dropped by [`AddressCache::purge_expired`] or overwritten by
/// a later [`AddressCache::put`]. Failed geocodes are never cached, so a
/// failing address retries the provider on its next use.
///
/// [`AddressCache::coordinates_for`] additionally guarantees at most one
/// outstanding geocode call per `(tenant, address)` key: concurrent misses
/// on the same key wait on the leader's call and share its outcome instead
/// of issuing duplicate billed requests.
#[derive(Debug)]
pub struct AddressCache {
    ttl: SignedDuration,
    entries: RwLock<FxHashMap<TenantId, FxHashMap<NormalizedAddress, CacheEntry>>>,
    inflight: Mutex<FxHashMap<InflightKey, watch::Receiver<SharedOutcome>>>,
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl AddressCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: SignedDuration) -> Self {
        Self {
            ttl,
            entries: RwLock::default(),
            inflight: Mutex::new(FxHashMap::default()),
        }
    }

    /// The configured validity window.
    #[must_use]
    pub fn ttl(&self) -> SignedDuration {
        self.ttl
    }

    /// Look up a fresh entry. Expired entries are reported as misses.
    #[must_use]
    pub fn get(&self, tenant: TenantId, address: &NormalizedAddress) -> Option<CacheEntry> {
        let entries = self.entries.read();
        let entry = entries.get(&tenant)?.get(address)?;

        entry
            .is_fresh(Timestamp::now(), self.ttl)
            .then(|| entry.clone())
    }

    /// Store an entry, overwriting any previous value for the key.
    pub fn put(&self, tenant: TenantId, address: NormalizedAddress, entry: CacheEntry) {
        self.entries
            .write()
            .entry(tenant)
            .or_default()
            .insert(address, entry);
    }

    /// Drop one cached address, returning whether an entry existed.
    pub fn invalidate(&self, tenant: TenantId, address: &NormalizedAddress) -> bool {
        let mut entries = self.entries.write();

        entries
            .get_mut(&tenant)
            .is_some_and(|map| map.remove(address).is_some())
    }

    /// Drop every expired entry across all tenants, returning how many were
    /// removed.
    pub fn purge_expired(&self) -> usize {
        let now = Timestamp::now();
        let mut entries = self.entries.write();
        let mut removed = 0;

        for map in entries.values_mut() {
            let before = map.len();
            map.retain(|_, entry| entry.is_fresh(now, self.ttl));
            removed += before - map.len();
        }

        entries.retain(|_, map| !map.is_empty());

        if removed > 0 {
            debug!(removed, "purged expired address cache entries");
        }

        removed
    }

    /// Entry counts for one tenant.
    #[must_use]
    pub fn stats(&self, tenant: TenantId) -> CacheStats {
        let now = Timestamp::now();
        let entries = self.entries.read();

        let Some(map) = entries.get(&tenant) else {
            return CacheStats::default();
        };

        CacheStats {
            total: map.len(),
            expired: map
                .values()
                .filter(|entry| !entry.is_fresh(now, self.ttl))
                .count(),
        }
    }

    /// Coordinates for `address`: from the cache when fresh, otherwise via a
    /// single geocode call shared by every concurrent request for the same
    /// key.
    ///
    /// `None` means the address could not be geocoded within `timeout`; the
    /// failure is shared with current waiters but never cached, so the next
    /// resolution retries the provider.
    pub async fn coordinates_for(
        &self,
        tenant: TenantId,
        address: &NormalizedAddress,
        geocoder: &dyn Geocoder,
        timeout: Duration,
    ) -> Option<Coordinates> {
        if let Some(entry) = self.get(tenant, address) {
            debug!(tenant = %tenant, "address cache hit");
            return Some(entry.coordinates);
        }

        let key = (tenant, address.clone());

        let tx = {
            let mut inflight = self.inflight.lock().await;

            // Re-check under the lock: a leader may have completed while this
            // task was waiting to inspect the in-flight map.
            if let Some(entry) = self.get(tenant, address) {
                return Some(entry.coordinates);
            }

            if let Some(rx) = inflight.get(&key) {
                let mut rx = rx.clone();
                drop(inflight);

                debug!(tenant = %tenant, "joining in-flight geocode");

                let received = rx
                    .wait_for(Option::is_some)
                    .await
                    .map(|outcome| (*outcome).flatten());

                return match received {
                    Ok(coordinates) => coordinates,
                    Err(_) => {
                        // Leader vanished without answering (cancelled
                        // mid-call). Clear the stale slot so the next
                        // request can retry instead of waiting forever.
                        let mut inflight = self.inflight.lock().await;

                        if inflight
                            .get(&key)
                            .is_some_and(|rx| rx.has_changed().is_err())
                        {
                            inflight.remove(&key);
                        }

                        None
                    }
                };
            }

            let (tx, rx) = watch::channel(None);
            inflight.insert(key.clone(), rx);
            tx
        };

        let outcome = match tokio::time::timeout(timeout, geocoder.geocode(address.as_str())).await
        {
            Ok(Ok(coordinates)) => Some(coordinates),
            Ok(Err(error)) => {
                warn!(tenant = %tenant, %error, "geocode failed");
                None
            }
            Err(_) => {
                warn!(tenant = %tenant, ?timeout, "geocode timed out");
                None
            }
        };

        self.inflight.lock().await.remove(&key);
        let _ = tx.send(Some(outcome));

        outcome
    }
}
