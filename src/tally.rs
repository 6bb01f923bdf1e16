use std::fmt;

use crate::filters::CellFilter;

/// What a tally scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Track-length flux estimate: sum of weight x path length in the
    /// filtered cells, per source particle. Volume normalization is left
    /// to the consumer.
    Flux,
    /// Particles lost through vacuum boundaries
    Leakage,
}

impl Score {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "flux" => Ok(Score::Flux),
            "leakage" => Ok(Score::Leakage),
            other => Err(format!("Unknown tally score '{}'", other)),
        }
    }
}

/// Unified tally structure serving as both input specification and
/// results container
#[derive(Debug, Clone)]
pub struct Tally {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub score: Score,
    /// Restrict scoring to one cell; None scores everywhere
    pub cell_filter: Option<CellFilter>,

    // Results fields (populated during simulation)
    pub batch_data: Vec<f64>,
    /// Mean per source particle
    pub mean: f64,
    /// Standard deviation of the batch means
    pub std_dev: f64,
    /// Relative error (coefficient of variation)
    pub rel_error: f64,
    pub n_batches: u32,
    pub particles_per_batch: u32,
}

impl Tally {
    pub fn new(score: Score) -> Self {
        Self {
            id: None,
            name: None,
            score,
            cell_filter: None,
            batch_data: Vec::new(),
            mean: 0.0,
            std_dev: 0.0,
            rel_error: 0.0,
            n_batches: 0,
            particles_per_batch: 0,
        }
    }

    pub fn with_name(score: Score, name: &str) -> Self {
        let mut tally = Self::new(score);
        tally.name = Some(name.to_string());
        tally
    }

    pub fn set_cell_filter(&mut self, filter: CellFilter) {
        self.cell_filter = Some(filter);
    }

    /// Check whether an event in the given cell scores into this tally
    pub fn filter_matches(&self, cell_id: u32) -> bool {
        match &self.cell_filter {
            Some(filter) => filter.matches(cell_id),
            None => true,
        }
    }

    /// Add a batch result and update statistics
    pub fn add_batch(&mut self, batch_total: f64, particles_per_batch: u32) {
        self.batch_data.push(batch_total);
        self.update_statistics(particles_per_batch);
    }

    fn update_statistics(&mut self, particles_per_batch: u32) {
        if self.batch_data.is_empty() || particles_per_batch == 0 {
            self.mean = 0.0;
            self.std_dev = 0.0;
            self.rel_error = 0.0;
            self.n_batches = 0;
            self.particles_per_batch = particles_per_batch;
            return;
        }

        let n = self.batch_data.len() as f64;
        let per_particle: Vec<f64> = self
            .batch_data
            .iter()
            .map(|&total| total / particles_per_batch as f64)
            .collect();

        self.mean = per_particle.iter().sum::<f64>() / n;
        let variance = per_particle
            .iter()
            .map(|x| (x - self.mean).powi(2))
            .sum::<f64>()
            / (n - 1.0).max(1.0);
        self.std_dev = variance.sqrt();
        self.rel_error = if self.mean > 0.0 {
            self.std_dev / self.mean
        } else {
            0.0
        };
        self.n_batches = n as u32;
        self.particles_per_batch = particles_per_batch;
    }

    /// Get the total score across all batches
    pub fn total(&self) -> f64 {
        self.batch_data.iter().sum()
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| "Unnamed Tally".to_string())
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tally name: {}", self.display_name())?;
        writeln!(f, "  Mean: {:.6} per particle", self.mean)?;
        writeln!(f, "    Std Dev: {:.6} per particle", self.std_dev)?;
        writeln!(
            f,
            "    Rel Error: {:.4} ({:.2}%)",
            self.rel_error,
            self.rel_error * 100.0
        )?;
        writeln!(f, "    Batches: {}", self.n_batches)?;
        writeln!(f, "    Particles per batch: {}", self.particles_per_batch)?;
        write!(f, "  Total: {:.6}", self.total())
    }
}

/// Initialize result tallies from user tally specifications. The leakage
/// tally always comes first, matching the position transport scores into.
pub fn create_tallies_from_specs(tally_specs: &[Tally]) -> Vec<Tally> {
    let mut tallies = Vec::new();
    tallies.push(Tally::with_name(Score::Leakage, "Leakage"));

    for (i, spec) in tally_specs.iter().enumerate() {
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("Tally {}", i + 1));
        let mut tally = Tally::with_name(spec.score, &name);
        tally.id = spec.id;
        tally.cell_filter = spec.cell_filter.clone();
        tallies.push(tally);
    }

    tallies
}
