//! In-memory zone storage.

use entrega::zones::ZoneSet;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::tenants::TenantId;

/// Process-local zone sets, one per tenant.
#[derive(Debug, Default)]
pub(crate) struct InMemoryZonesRepository {
    sets: RwLock<FxHashMap<TenantId, ZoneSet>>,
}

impl InMemoryZonesRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the tenant's set under a read lock.
    pub(crate) fn read<T>(&self, tenant: TenantId, f: impl FnOnce(&ZoneSet) -> T) -> T {
        let sets = self.sets.read();

        match sets.get(&tenant) {
            Some(set) => f(set),
            None => f(&ZoneSet::new()),
        }
    }

    /// Run `f` against the tenant's set under a write lock, creating the set
    /// on first use.
    pub(crate) fn write<T>(&self, tenant: TenantId, f: impl FnOnce(&mut ZoneSet) -> T) -> T {
        let mut sets = self.sets.write();

        f(sets.entry(tenant).or_default())
    }
}
