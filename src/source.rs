use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::bank_file::BankReader;
use crate::error::BankError;
use crate::particle::{Particle, ParticleType};
use crate::source_site::SourceSite;
use crate::stats::AngularDistribution;

/// Probabilistic point source used by write runs
#[derive(Debug, Clone)]
pub struct IndependentSource {
    pub space: [f64; 3],
    pub angle: AngularDistribution,
    pub energy: f64,
    pub particle_type: ParticleType,
}

impl IndependentSource {
    pub fn new() -> Self {
        Self {
            space: [0.0, 0.0, 0.0],
            angle: AngularDistribution::Isotropic,
            energy: 14.06e6,
            particle_type: ParticleType::Neutron,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        let mut particle = Particle::new(self.space, self.angle.sample(rng), self.energy);
        particle.particle_type = self.particle_type;
        particle
    }
}

impl Default for IndependentSource {
    fn default() -> Self {
        Self::new()
    }
}

/// What a replay source does when every stored record has been drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Fail with `SourceExhausted` once the bank is drained (default)
    Exhaust,
    /// Wrap the cursor and reuse records. Reused records are statistically
    /// correlated with their first use; accounting for that is the
    /// caller's responsibility.
    Cycle,
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        ReplayPolicy::Exhaust
    }
}

/// Replays a loaded bank as a particle source.
///
/// The record sequence is immutable after load; the only mutable state is
/// an atomic cursor, so any number of transport workers can draw
/// concurrently. Draws are sequential via [`next`](ReplaySource::next) or
/// deterministic via [`get`](ReplaySource::get).
pub struct ReplaySource {
    sites: Vec<SourceSite>,
    cursor: AtomicUsize,
    policy: ReplayPolicy,
}

impl ReplaySource {
    pub fn new(sites: Vec<SourceSite>, policy: ReplayPolicy) -> Self {
        Self {
            sites,
            cursor: AtomicUsize::new(0),
            policy,
        }
    }

    /// Load a bank file and wrap it as a source
    pub fn from_file(path: &Path, policy: ReplayPolicy) -> Result<Self, BankError> {
        let file = BankReader::read(path)?;
        Ok(Self::new(file.sites, policy))
    }

    /// Number of records loaded
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Records not yet drawn. Zero under the `Cycle` policy once the
    /// first pass completes, although `next` keeps succeeding.
    pub fn remaining(&self) -> usize {
        self.sites
            .len()
            .saturating_sub(self.cursor.load(Ordering::Relaxed))
    }

    /// Draw the next unused record. The cursor advance is a single atomic
    /// increment, mirroring the bank's slot reservation: concurrent
    /// callers each get a distinct record.
    pub fn next(&self) -> Result<SourceSite, BankError> {
        if self.sites.is_empty() {
            return Err(BankError::SourceExhausted);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        match self.policy {
            ReplayPolicy::Exhaust => self
                .sites
                .get(index)
                .cloned()
                .ok_or(BankError::SourceExhausted),
            ReplayPolicy::Cycle => Ok(self.sites[index % self.sites.len()].clone()),
        }
    }

    /// Deterministic draw-by-index, independent of the shared cursor
    pub fn get(&self, index: usize) -> Option<&SourceSite> {
        self.sites.get(index)
    }

    /// Start a particle history from a replayed record
    pub fn particle_from(site: &SourceSite) -> Particle {
        Particle {
            particle_type: site.particle_type,
            position: site.position,
            direction: site.direction,
            energy: site.energy,
            time: site.time,
            weight: site.weight,
            alive: true,
        }
    }
}
