// First, import the modules and re-export the types for Rust usage
pub mod bank;
pub mod bank_file;
pub mod cell;
pub mod error;
pub mod fast_rng;
pub mod filters;
pub mod geometry;
pub mod model;
pub mod particle;
pub mod region;
pub mod settings;
pub mod source;
pub mod source_site;
pub mod stats;
pub mod surface;
pub mod tally;

pub use bank::{AppendOutcome, SurfaceBank};
pub use bank_file::{BankFile, BankReader, BankWriter, RunMetadata, SOURCE_BANK_DATASET};
pub use cell::Cell;
pub use error::BankError;
pub use fast_rng::FastRng;
pub use filters::{CellFilter, CrossingDirection, SurfaceFilter};
pub use geometry::Geometry;
pub use model::{Model, RunResults};
pub use particle::{Particle, ParticleType};
pub use region::{HalfspaceType, Region};
pub use settings::{Settings, SurfSrcRead, SurfSrcWrite, DEFAULT_BANK_PATH};
pub use source::{IndependentSource, ReplayPolicy, ReplaySource};
pub use source_site::{sites_set_equal, sort_sites, SourceSite};
pub use stats::AngularDistribution;
pub use surface::{BoundaryType, Surface, SurfaceKind};
pub use tally::{create_tallies_from_specs, Score, Tally};
