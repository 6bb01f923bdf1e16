/// Kinds of particles that can be transported and banked.
///
/// The discriminant values are part of the bank file format and must not
/// be reordered; see `bank_file` for the on-disk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleType {
    Neutron,
    Photon,
    Electron,
    Positron,
}

impl ParticleType {
    /// Encode as the u32 tag stored in bank files
    pub fn to_u32(self) -> u32 {
        match self {
            ParticleType::Neutron => 0,
            ParticleType::Photon => 1,
            ParticleType::Electron => 2,
            ParticleType::Positron => 3,
        }
    }

    /// Decode from a u32 tag, returning None for unknown tags
    pub fn from_u32(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(ParticleType::Neutron),
            1 => Some(ParticleType::Photon),
            2 => Some(ParticleType::Electron),
            3 => Some(ParticleType::Positron),
            _ => None,
        }
    }

    /// Rest mass energy in eV (zero for photons)
    pub fn mass_ev(self) -> f64 {
        match self {
            ParticleType::Neutron => 939.565_420_52e6,
            ParticleType::Photon => 0.0,
            ParticleType::Electron | ParticleType::Positron => 0.510_998_95e6,
        }
    }
}

/// Speed of light in cm/s, the unit system used throughout
pub const C_LIGHT: f64 = 2.997_924_58e10;

#[derive(Debug, Clone)]
pub struct Particle {
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    /// Kinetic energy in eV
    pub energy: f64,
    /// Simulation clock in seconds, advanced as the particle streams
    pub time: f64,
    /// Statistical weight
    pub weight: f64,
    pub alive: bool,
}

impl Particle {
    pub fn new(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Self {
            particle_type: ParticleType::Neutron,
            position,
            direction,
            energy,
            time: 0.0,
            weight: 1.0,
            alive: true,
        }
    }

    /// Particle speed in cm/s from relativistic kinematics.
    /// Massless particles move at c; for massive particles
    /// v = c * sqrt(1 - (mc^2 / (E + mc^2))^2).
    pub fn speed(&self) -> f64 {
        let mass = self.particle_type.mass_ev();
        if mass == 0.0 {
            return C_LIGHT;
        }
        let gamma_inv = mass / (self.energy + mass);
        C_LIGHT * (1.0 - gamma_inv * gamma_inv).sqrt()
    }

    /// Advance the particle along its direction, updating position and clock
    pub fn move_by(&mut self, distance: f64) {
        self.position[0] += distance * self.direction[0];
        self.position[1] += distance * self.direction[1];
        self.position[2] += distance * self.direction[2];
        let speed = self.speed();
        if speed > 0.0 {
            self.time += distance / speed;
        }
    }
}
