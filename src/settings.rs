use std::path::PathBuf;

use crate::source::{IndependentSource, ReplayPolicy};

/// Default file name for a written surface-source bank
pub const DEFAULT_BANK_PATH: &str = "surface_source.bank";

/// Surface-source write configuration. An empty `surf_ids` list disables
/// banking: the run still produces a valid, empty bank file at `path`.
#[derive(Debug, Clone)]
pub struct SurfSrcWrite {
    /// Surfaces whose crossings are recorded
    pub surf_ids: Vec<u32>,
    /// Bank capacity; crossings past this count are dropped
    pub max_surf_banks: usize,
    /// Destination bank file
    pub path: PathBuf,
    /// Sort records by their natural ordering key before writing, for
    /// bit-identical files across differently-partitioned runs
    pub deterministic: bool,
}

impl SurfSrcWrite {
    pub fn new(surf_ids: Vec<u32>, max_surf_banks: usize) -> Self {
        Self {
            surf_ids,
            max_surf_banks,
            path: PathBuf::from(DEFAULT_BANK_PATH),
            deterministic: false,
        }
    }
}

/// Surface-source read configuration
#[derive(Debug, Clone)]
pub struct SurfSrcRead {
    /// Bank file to replay as the run's source
    pub path: PathBuf,
    pub policy: ReplayPolicy,
}

impl SurfSrcRead {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: ReplayPolicy::default(),
        }
    }
}

/// Run configuration, constructed once at run start and passed by
/// reference to every worker. There is no global settings singleton.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Particle histories per batch
    pub particles: usize,
    pub batches: usize,
    pub seed: u64,
    /// Worker threads transporting histories; 1 runs serially
    pub threads: usize,
    pub source: IndependentSource,
    /// When set, record surface crossings and write a bank file
    pub surf_src_write: Option<SurfSrcWrite>,
    /// When set, replay a bank file instead of sampling `source`
    pub surf_src_read: Option<SurfSrcRead>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: 1000,
            batches: 10,
            seed: 1,
            threads: 1,
            source: IndependentSource::new(),
            surf_src_write: None,
            surf_src_read: None,
        }
    }
}
