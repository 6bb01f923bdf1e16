use std::collections::HashMap;

use crate::cell::Cell;

/// Which crossings of a banked surface are recorded, relative to the
/// surface's positive sense (a positive dot product of the flight
/// direction with the outward normal is an outgoing crossing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossingDirection {
    Both,
    Outgoing,
    Incoming,
}

/// Membership test for the configured bank surfaces.
///
/// Built once at run start and read-only afterwards, so it is safe to
/// share across worker threads. `matches` is called on the hot path for
/// every tracked crossing; it performs one hash lookup and never
/// allocates. An empty filter disables banking: write mode still produces
/// a valid, empty bank file.
#[derive(Debug, Clone, Default)]
pub struct SurfaceFilter {
    surfaces: HashMap<u32, CrossingDirection>,
}

impl SurfaceFilter {
    /// Filter that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bank every crossing of the given surfaces, in both directions
    pub fn from_ids(surf_ids: &[u32]) -> Self {
        Self {
            surfaces: surf_ids
                .iter()
                .map(|&id| (id, CrossingDirection::Both))
                .collect(),
        }
    }

    /// Bank crossings of the given surfaces in the given directions only
    pub fn with_directions(surfaces: impl IntoIterator<Item = (u32, CrossingDirection)>) -> Self {
        Self {
            surfaces: surfaces.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Check whether a crossing of `surface_id` travelling in the given
    /// sense should be banked
    pub fn matches(&self, surface_id: u32, outgoing: bool) -> bool {
        match self.surfaces.get(&surface_id) {
            Some(CrossingDirection::Both) => true,
            Some(CrossingDirection::Outgoing) => outgoing,
            Some(CrossingDirection::Incoming) => !outgoing,
            None => false,
        }
    }

    /// The configured surface identifiers, in unspecified order
    pub fn surface_ids(&self) -> Vec<u32> {
        self.surfaces.keys().copied().collect()
    }
}

/// Cell filter for tallies - filters events based on which cell they occur in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellFilter {
    /// The cell ID to filter on
    pub cell_id: u32,
}

impl CellFilter {
    /// Create a CellFilter from a Cell object
    pub fn new(cell: &Cell) -> Self {
        Self {
            cell_id: cell.cell_id,
        }
    }

    /// Check if this filter matches a given cell ID
    pub fn matches(&self, cell_id: u32) -> bool {
        self.cell_id == cell_id
    }

    /// Check if this filter matches a given cell object
    pub fn matches_cell(&self, cell: &Cell) -> bool {
        cell.cell_id == self.cell_id
    }
}
