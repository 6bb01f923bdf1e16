use std::cmp::Ordering;

use crate::particle::{Particle, ParticleType};

/// Tolerance on the unit-norm direction invariant. An f64 direction that
/// round-trips through the bank file keeps its exact bits, so this only
/// needs to absorb accumulated arithmetic error from transport itself.
pub const DIRECTION_NORM_TOLERANCE: f64 = 1e-6;

/// Phase-space state of a particle at the instant it crossed a banked
/// surface. Immutable once created; this is the unit of storage for
/// [`SurfaceBank`](crate::bank::SurfaceBank) and the record type of the
/// bank file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSite {
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    /// Kinetic energy in eV, non-negative
    pub energy: f64,
    /// Simulation clock at the crossing, seconds
    pub time: f64,
    /// Statistical weight, strictly positive
    pub weight: f64,
    /// Identifier of the crossed surface
    pub surface_id: u32,
}

impl SourceSite {
    /// Capture a particle's state as a crossing record at the given surface
    pub fn from_particle(particle: &Particle, surface_id: u32) -> Self {
        Self {
            particle_type: particle.particle_type,
            position: particle.position,
            direction: particle.direction,
            energy: particle.energy,
            time: particle.time,
            weight: particle.weight,
            surface_id,
        }
    }

    /// Check the field invariants: unit-norm direction, finite non-negative
    /// energy, finite positive weight, finite time and position.
    /// Both the writer and the reader reject violating records.
    pub fn validate(&self) -> Result<(), String> {
        for (axis, value) in ["x", "y", "z"].iter().zip(self.position) {
            if !value.is_finite() {
                return Err(format!("position {} is not finite: {}", axis, value));
            }
        }
        let norm = (self.direction[0] * self.direction[0]
            + self.direction[1] * self.direction[1]
            + self.direction[2] * self.direction[2])
            .sqrt();
        if !norm.is_finite() || (norm - 1.0).abs() > DIRECTION_NORM_TOLERANCE {
            return Err(format!("direction is not unit-norm: |u| = {}", norm));
        }
        if !self.energy.is_finite() || self.energy < 0.0 {
            return Err(format!("energy must be finite and non-negative: {}", self.energy));
        }
        if !self.time.is_finite() {
            return Err(format!("time is not finite: {}", self.time));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(format!("weight must be finite and positive: {}", self.weight));
        }
        Ok(())
    }

    /// Total order over the lexicographic tuple of all fields.
    ///
    /// Storage order inside a bank carries no meaning, so comparing two
    /// banks means comparing sorted copies. This is also the key used when
    /// a file is written in deterministic mode.
    pub fn order_key(&self, other: &Self) -> Ordering {
        self.particle_type
            .to_u32()
            .cmp(&other.particle_type.to_u32())
            .then_with(|| cmp_f64_triple(&self.position, &other.position))
            .then_with(|| cmp_f64_triple(&self.direction, &other.direction))
            .then_with(|| self.energy.total_cmp(&other.energy))
            .then_with(|| self.time.total_cmp(&other.time))
            .then_with(|| self.weight.total_cmp(&other.weight))
            .then_with(|| self.surface_id.cmp(&other.surface_id))
    }
}

fn cmp_f64_triple(a: &[f64; 3], b: &[f64; 3]) -> Ordering {
    a[0].total_cmp(&b[0])
        .then_with(|| a[1].total_cmp(&b[1]))
        .then_with(|| a[2].total_cmp(&b[2]))
}

/// Sort records in place by the natural ordering key
pub fn sort_sites(sites: &mut [SourceSite]) {
    sites.sort_unstable_by(|a, b| a.order_key(b));
}

/// Multiset equality of two banks: same records regardless of order
pub fn sites_set_equal(a: &[SourceSite], b: &[SourceSite]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    sort_sites(&mut a_sorted);
    sort_sites(&mut b_sorted);
    a_sorted == b_sorted
}
