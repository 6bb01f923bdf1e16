use rand::Rng;

/// Angular distribution for source emission
#[derive(Debug, Clone)]
pub enum AngularDistribution {
    Isotropic,
    Monodirectional { reference_uvw: [f64; 3] },
}

impl AngularDistribution {
    /// Create a new monodirectional distribution
    pub fn new_monodirectional(u: f64, v: f64, w: f64) -> Self {
        // Normalize the direction vector
        let mag = (u * u + v * v + w * w).sqrt();
        if mag == 0.0 {
            panic!("Direction vector cannot be zero");
        }
        Self::Monodirectional {
            reference_uvw: [u / mag, v / mag, w / mag],
        }
    }

    /// Create a new isotropic distribution
    pub fn new_isotropic() -> Self {
        Self::Isotropic
    }

    /// Sample a direction from this distribution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; 3] {
        match self {
            AngularDistribution::Isotropic => {
                let xi1: f64 = rng.gen();
                let xi2: f64 = rng.gen();

                // Uniform on the unit sphere: cosine of the polar angle
                // uniform in [-1, 1), azimuth uniform in [0, 2pi)
                let mu = 2.0 * xi1 - 1.0;
                let phi = 2.0 * std::f64::consts::PI * xi2;

                let sqrt_one_minus_mu2 = (1.0 - mu * mu).sqrt();
                [
                    sqrt_one_minus_mu2 * phi.cos(),
                    sqrt_one_minus_mu2 * phi.sin(),
                    mu,
                ]
            }
            AngularDistribution::Monodirectional { reference_uvw } => *reference_uvw,
        }
    }
}
