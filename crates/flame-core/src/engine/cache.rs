use crate::core::elements::{ElementError, Transfer, TransferContext};
use crate::core::math::{PS_PX, PS_PY, PS_X, PS_Y};
use crate::core::models::Particle;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Entries kept per element before the oldest is evicted.
pub const CACHE_CAPACITY: usize = 16;

type ParticleKey = [u64; 7];

fn particle_key(p: &Particle) -> ParticleKey {
    [
        p.ion_z.to_bits(),
        p.ion_a.to_bits(),
        p.ion_es.to_bits(),
        p.ion_ek.to_bits(),
        p.phis.to_bits(),
        p.pos.to_bits(),
        p.last_caviphi0.to_bits(),
    ]
}

/// Exact entrance conditions of one charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferKey {
    design: ParticleKey,
    actual: ParticleKey,
    centroid: Option<[u64; 4]>,
}

impl TransferKey {
    pub fn new(ctx: &TransferContext<'_>, with_centroid: bool) -> Self {
        let c = ctx.centroid;
        Self {
            design: particle_key(ctx.design),
            actual: particle_key(ctx.actual),
            centroid: with_centroid.then(|| {
                [
                    c[PS_X].to_bits(),
                    c[PS_PX].to_bits(),
                    c[PS_Y].to_bits(),
                    c[PS_PY].to_bits(),
                ]
            }),
        }
    }
}

#[derive(Debug)]
struct Fifo<K, V> {
    entries: RwLock<VecDeque<(K, V)>>,
}

impl<K, V> Default for Fifo<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(CACHE_CAPACITY)),
        }
    }
}

impl<K: PartialEq, V: Clone> Fifo<K, V> {
    fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|(k, _)| *k == key) {
            return;
        }
        if entries.len() == CACHE_CAPACITY {
            entries.pop_front();
        }
        entries.push_back((key, value));
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Lazily filled per-element memo of design advances and charge-state transfers.
#[derive(Debug, Default)]
pub struct TransferCache {
    advances: Fifo<ParticleKey, Particle>,
    transfers: Fifo<TransferKey, Transfer>,
}

impl Clone for TransferCache {
    /// Clones start empty; cached maps belong to the element configuration they
    /// were computed for.
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl TransferCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(
        &self,
        design_in: &Particle,
        compute: impl FnOnce() -> Result<Particle, ElementError>,
    ) -> Result<Particle, ElementError> {
        let key = particle_key(design_in);
        if let Some(hit) = self.advances.get(&key) {
            return Ok(hit);
        }
        let particle = compute()?;
        self.advances.insert(key, particle);
        Ok(particle)
    }

    pub fn transfer(
        &self,
        key: TransferKey,
        compute: impl FnOnce() -> Result<Transfer, ElementError>,
    ) -> Result<Transfer, ElementError> {
        if let Some(hit) = self.transfers.get(&key) {
            return Ok(hit);
        }
        let transfer = compute()?;
        debug!(entries = self.transfers.len(), "Transfer cache refill");
        self.transfers.insert(key, transfer.clone());
        Ok(transfer)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.advances.clear();
        self.transfers.clear();
    }
}
