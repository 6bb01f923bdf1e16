// Transport coordinator
//
// Streams particle histories through a void geometry, banking surface
// crossings in write mode and replaying a bank file in read mode. Each
// history draws from an RNG stream derived only from (seed, history
// index), so the set of banked crossings does not depend on how histories
// are split across worker threads.

use std::ops::Range;

use crate::bank::SurfaceBank;
use crate::bank_file::{BankWriter, RunMetadata};
use crate::error::BankError;
use crate::fast_rng::FastRng;
use crate::filters::SurfaceFilter;
use crate::geometry::Geometry;
use crate::particle::Particle;
use crate::settings::Settings;
use crate::source::ReplaySource;
use crate::source_site::SourceSite;
use crate::surface::BoundaryType;
use crate::tally::{create_tallies_from_specs, Score, Tally};

/// Nudge past a crossed surface to avoid geometric ambiguity
const SURFACE_TOLERANCE: f64 = 1e-8;

/// Index of the built-in leakage tally in the results vector
const LEAKAGE_TALLY: usize = 0;

enum TransportSource {
    Independent,
    Replay(ReplaySource),
}

/// Outcome of a run: result tallies plus the bank bookkeeping that makes
/// capacity overflow observable
pub struct RunResults {
    pub tallies: Vec<Tally>,
    /// Records stored in the written bank (write mode)
    pub banked: usize,
    /// Crossing events offered to the bank, stored or dropped
    pub bank_attempts: usize,
}

pub struct Model {
    pub geometry: Geometry,
    pub settings: Settings,
    /// User tally specifications; results are returned in [`RunResults`]
    /// with a leakage tally prepended
    pub tallies: Vec<Tally>,
}

impl Model {
    /// Run the simulation: `batches` x `particles` histories in
    /// fixed-source mode. In write mode the surface bank is flushed to
    /// its bank file after the last batch; in read mode histories start
    /// from replayed bank records instead of the probabilistic source.
    pub fn run(&self) -> Result<RunResults, BankError> {
        let source = match &self.settings.surf_src_read {
            Some(read) => {
                TransportSource::Replay(ReplaySource::from_file(&read.path, read.policy)?)
            }
            None => TransportSource::Independent,
        };

        let (filter, bank) = match &self.settings.surf_src_write {
            Some(write) if !write.surf_ids.is_empty() && write.max_surf_banks > 0 => (
                SurfaceFilter::from_ids(&write.surf_ids),
                Some(SurfaceBank::new(write.max_surf_banks)),
            ),
            // Banking disabled; a requested write still yields an empty file
            _ => (SurfaceFilter::empty(), None),
        };

        let mut tallies = create_tallies_from_specs(&self.tallies);
        let threads = self.settings.threads.max(1);
        let particles = self.settings.particles;

        for batch in 0..self.settings.batches {
            let batch_totals = if threads == 1 {
                self.run_chunk(batch, 0..particles, &source, &filter, bank.as_ref())?
            } else {
                self.run_batch_threaded(batch, threads, &source, &filter, bank.as_ref())?
            };
            for (tally, total) in tallies.iter_mut().zip(&batch_totals) {
                tally.add_batch(*total, particles as u32);
            }
        }

        let (banked, bank_attempts) = self.flush_bank(bank)?;

        Ok(RunResults {
            tallies,
            banked,
            bank_attempts,
        })
    }

    fn run_batch_threaded(
        &self,
        batch: usize,
        threads: usize,
        source: &TransportSource,
        filter: &SurfaceFilter,
        bank: Option<&SurfaceBank>,
    ) -> Result<Vec<f64>, BankError> {
        let particles = self.settings.particles;
        let chunk = particles.div_ceil(threads);

        let results: Vec<Result<Vec<f64>, BankError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .filter_map(|t| {
                    let start = t * chunk;
                    let end = particles.min(start + chunk);
                    if start >= end {
                        return None;
                    }
                    Some(scope.spawn(move || {
                        self.run_chunk(batch, start..end, source, filter, bank)
                    }))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("transport worker panicked"))
                .collect()
        });

        let mut totals = vec![0.0; self.tallies.len() + 1];
        for result in results {
            for (total, partial) in totals.iter_mut().zip(result?) {
                *total += partial;
            }
        }
        Ok(totals)
    }

    /// Transport a contiguous range of this batch's histories, returning
    /// per-tally totals (leakage first, then user tallies in order)
    fn run_chunk(
        &self,
        batch: usize,
        range: Range<usize>,
        source: &TransportSource,
        filter: &SurfaceFilter,
        bank: Option<&SurfaceBank>,
    ) -> Result<Vec<f64>, BankError> {
        let mut totals = vec![0.0; self.tallies.len() + 1];
        for index in range {
            let particle = match source {
                TransportSource::Independent => {
                    let history = (batch * self.settings.particles + index) as u64;
                    let mut rng = FastRng::for_history(self.settings.seed, history);
                    self.settings.source.sample(&mut rng)
                }
                TransportSource::Replay(replay) => {
                    let mut particle = ReplaySource::particle_from(&replay.next()?);
                    // Banked records sit exactly on their surface, which
                    // belongs to no cell; step off it before the first
                    // cell lookup, like any other crossing.
                    particle.move_by(SURFACE_TOLERANCE);
                    particle
                }
            };
            self.transport_history(particle, filter, bank, &mut totals);
        }
        Ok(totals)
    }

    /// Stream one particle through the void geometry until it leaks
    fn transport_history(
        &self,
        mut particle: Particle,
        filter: &SurfaceFilter,
        bank: Option<&SurfaceBank>,
        totals: &mut [f64],
    ) {
        while particle.alive {
            let point = (
                particle.position[0],
                particle.position[1],
                particle.position[2],
            );
            let cell = self.geometry.find_cell(point).unwrap_or_else(|| {
                panic!(
                    "Particle location not found within any cells at x={}, y={}, z={} - geometry definition error",
                    point.0, point.1, point.2
                )
            });

            let (surface, dist) = cell
                .closest_surface(particle.position, particle.direction)
                .unwrap_or_else(|| {
                    panic!(
                        "No surface found for particle at x={}, y={}, z={} with direction [{}, {}, {}] in cell {} - geometry definition error",
                        point.0, point.1, point.2,
                        particle.direction[0], particle.direction[1], particle.direction[2],
                        cell.cell_id
                    )
                });

            // Track-length flux scoring for the flight through this cell
            for (i, spec) in self.tallies.iter().enumerate() {
                if spec.score == Score::Flux && spec.filter_matches(cell.cell_id) {
                    totals[i + 1] += dist * particle.weight;
                }
            }

            // Bank the crossing if this surface is configured. The record
            // captures the state exactly at the crossing point, before the
            // nudge past the surface.
            if !filter.is_empty() {
                let outgoing = surface.evaluate(point) < 0.0;
                if filter.matches(surface.surface_id, outgoing) {
                    if let Some(bank) = bank {
                        let mut at_crossing = particle.clone();
                        at_crossing.move_by(dist);
                        bank.try_append(SourceSite::from_particle(
                            &at_crossing,
                            surface.surface_id,
                        ));
                    }
                }
            }

            if *surface.boundary_type() == BoundaryType::Vacuum {
                particle.alive = false;
                totals[LEAKAGE_TALLY] += particle.weight;
            } else {
                particle.move_by(dist + SURFACE_TOLERANCE);
            }
        }
    }

    /// Move the finalized bank into the writer. The bank is consumed
    /// here; nothing can append after this point.
    fn flush_bank(&self, bank: Option<SurfaceBank>) -> Result<(usize, usize), BankError> {
        let Some(write) = &self.settings.surf_src_write else {
            return Ok((0, 0));
        };

        let metadata = RunMetadata {
            seed: self.settings.seed,
            particles: self.settings.particles,
            batches: self.settings.batches,
            surf_ids: write.surf_ids.clone(),
        };
        let writer = BankWriter::new()
            .deterministic(write.deterministic)
            .with_metadata(metadata);

        match bank {
            Some(bank) => {
                let attempts = bank.attempts();
                let sites = bank.finalize();
                writer.write(&write.path, &sites)?;
                Ok((sites.len(), attempts))
            }
            None => {
                writer.write(&write.path, &[])?;
                Ok((0, 0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::region::{HalfspaceType, Region};
    use crate::surface::Surface;
    use std::sync::Arc;

    /// Single void sphere with a vacuum boundary
    fn bare_sphere(radius: f64) -> Geometry {
        let sphere = Arc::new(Surface::new_sphere(
            0.0,
            0.0,
            0.0,
            radius,
            1,
            Some(BoundaryType::Vacuum),
        ));
        let cell = Cell::new(
            1,
            Region::new_from_halfspace(HalfspaceType::Below(sphere)),
            None,
        );
        Geometry::new(vec![cell]).unwrap()
    }

    #[test]
    fn test_all_particles_leak_from_void_sphere() {
        let model = Model {
            geometry: bare_sphere(2.0),
            settings: Settings {
                particles: 100,
                batches: 3,
                ..Settings::default()
            },
            tallies: Vec::new(),
        };

        let results = model.run().unwrap();
        // Every history leaks; leakage per particle is exactly 1
        let leakage = &results.tallies[LEAKAGE_TALLY];
        assert!((leakage.mean - 1.0).abs() < 1e-12);
        assert_eq!(results.banked, 0);
    }

    #[test]
    fn test_flux_in_bare_sphere_equals_radius() {
        // From a point source at the center every track is exactly one
        // radius long, so the track-length flux per particle is r
        let radius = 2.0;
        let mut flux = Tally::new(Score::Flux);
        flux.name = Some("sphere flux".to_string());

        let model = Model {
            geometry: bare_sphere(radius),
            settings: Settings {
                particles: 50,
                batches: 2,
                ..Settings::default()
            },
            tallies: vec![flux],
        };

        let results = model.run().unwrap();
        let flux = &results.tallies[1];
        assert!((flux.mean - radius).abs() < 1e-9);
        assert!(flux.std_dev < 1e-9);
    }

    #[test]
    fn test_write_mode_banks_boundary_crossings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface_source.bank");

        let mut write = crate::settings::SurfSrcWrite::new(vec![1], 500);
        write.path = path.clone();

        let model = Model {
            geometry: bare_sphere(2.0),
            settings: Settings {
                particles: 100,
                batches: 2,
                surf_src_write: Some(write),
                ..Settings::default()
            },
            tallies: Vec::new(),
        };

        let results = model.run().unwrap();
        // 200 histories all cross surface 1 once; 500-slot bank holds them all
        assert_eq!(results.bank_attempts, 200);
        assert_eq!(results.banked, 200);

        let file = crate::bank_file::BankReader::read(&path).unwrap();
        assert_eq!(file.sites.len(), 200);
        for site in &file.sites {
            assert_eq!(site.surface_id, 1);
            assert!(site.validate().is_ok());
        }
    }

    #[test]
    fn test_empty_surf_ids_writes_empty_bank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface_source.bank");

        let mut write = crate::settings::SurfSrcWrite::new(Vec::new(), 100);
        write.path = path.clone();

        let model = Model {
            geometry: bare_sphere(2.0),
            settings: Settings {
                particles: 10,
                batches: 1,
                surf_src_write: Some(write),
                ..Settings::default()
            },
            tallies: Vec::new(),
        };

        let results = model.run().unwrap();
        assert_eq!(results.banked, 0);

        let file = crate::bank_file::BankReader::read(&path).unwrap();
        assert!(file.sites.is_empty());
    }

    #[test]
    fn test_replayed_histories_start_on_the_banked_surface() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface_source.bank");

        // Inner transmission sphere at r=1 is banked; vacuum at r=2
        let inner = Arc::new(Surface::new_sphere(0.0, 0.0, 0.0, 1.0, 1, None));
        let outer = Arc::new(Surface::new_sphere(
            0.0,
            0.0,
            0.0,
            2.0,
            2,
            Some(BoundaryType::Vacuum),
        ));
        let cells = vec![
            Cell::new(
                1,
                Region::new_from_halfspace(HalfspaceType::Below(inner.clone())),
                None,
            ),
            Cell::new(
                2,
                Region::new_from_halfspace(HalfspaceType::Above(inner))
                    .intersection(&Region::new_from_halfspace(HalfspaceType::Below(outer))),
                None,
            ),
        ];

        let mut write = crate::settings::SurfSrcWrite::new(vec![1], 100);
        write.path = path.clone();
        let results = Model {
            geometry: Geometry::new(cells.clone()).unwrap(),
            settings: Settings {
                particles: 50,
                batches: 1,
                surf_src_write: Some(write),
                ..Settings::default()
            },
            tallies: Vec::new(),
        }
        .run()
        .unwrap();
        assert_eq!(results.banked, 50);

        // Every replayed record lies exactly on surface 1. The read run
        // must transport all of them out through the vacuum boundary
        // instead of losing them on the cell seam.
        let read_results = Model {
            geometry: Geometry::new(cells).unwrap(),
            settings: Settings {
                particles: 50,
                batches: 1,
                surf_src_read: Some(crate::settings::SurfSrcRead::new(path)),
                ..Settings::default()
            },
            tallies: Vec::new(),
        }
        .run()
        .unwrap();
        assert!((read_results.tallies[LEAKAGE_TALLY].mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_capacity_limits_banked_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface_source.bank");

        let mut write = crate::settings::SurfSrcWrite::new(vec![1], 30);
        write.path = path.clone();

        let model = Model {
            geometry: bare_sphere(2.0),
            settings: Settings {
                particles: 100,
                batches: 1,
                surf_src_write: Some(write),
                ..Settings::default()
            },
            tallies: Vec::new(),
        };

        let results = model.run().unwrap();
        assert_eq!(results.bank_attempts, 100);
        assert_eq!(results.banked, 30);
    }
}
