//! In-memory band storage.

use entrega::bands::RadiusLadder;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{bands::models::CenterPoint, tenants::TenantId};

/// A tenant's radius configuration: the ladder plus its center point.
#[derive(Debug, Clone, Default)]
pub(crate) struct TenantBands {
    pub(crate) ladder: RadiusLadder,
    pub(crate) center: Option<CenterPoint>,
}

/// Process-local band configuration, one entry per tenant.
#[derive(Debug, Default)]
pub(crate) struct InMemoryBandsRepository {
    state: RwLock<FxHashMap<TenantId, TenantBands>>,
}

impl InMemoryBandsRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the tenant's configuration under a read lock.
    pub(crate) fn read<T>(&self, tenant: TenantId, f: impl FnOnce(&TenantBands) -> T) -> T {
        let state = self.state.read();

        match state.get(&tenant) {
            Some(bands) => f(bands),
            None => f(&TenantBands::default()),
        }
    }

    /// Run `f` against the tenant's configuration under a write lock,
    /// creating it on first use.
    pub(crate) fn write<T>(&self, tenant: TenantId, f: impl FnOnce(&mut TenantBands) -> T) -> T {
        let mut state = self.state.write();

        f(state.entry(tenant).or_default())
    }
}
