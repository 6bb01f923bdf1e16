use crate::cell::Cell;
use std::collections::HashSet;

/// Geometry is a collection of cells for Monte Carlo transport
#[derive(Clone)]
pub struct Geometry {
    pub cells: Vec<Cell>,
}

impl Geometry {
    /// Create a new geometry, validating that cell IDs and surface IDs
    /// are unique
    pub fn new(cells: Vec<Cell>) -> Result<Self, String> {
        let mut used_cell_ids = HashSet::new();
        for cell in &cells {
            if !used_cell_ids.insert(cell.cell_id) {
                return Err(format!(
                    "Duplicate cell_id {} found. All cell IDs must be unique.",
                    cell.cell_id
                ));
            }
        }

        // Surfaces shared between cells are the same Arc, so dedup by
        // pointer before checking ID uniqueness
        let mut seen_ptrs = HashSet::new();
        let mut used_surface_ids = HashSet::new();
        for cell in &cells {
            for surface in cell.region.surfaces() {
                if seen_ptrs.insert(std::sync::Arc::as_ptr(&surface)) {
                    if !used_surface_ids.insert(surface.surface_id) {
                        return Err(format!(
                            "Duplicate surface_id {} found. All surface IDs must be unique.",
                            surface.surface_id
                        ));
                    }
                }
            }
        }

        Ok(Geometry { cells })
    }

    /// Find the cell containing a point, or None if the point is outside
    /// every cell
    pub fn find_cell(&self, point: (f64, f64, f64)) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.contains(point))
    }

    /// All surface IDs referenced by the geometry
    pub fn surface_ids(&self) -> HashSet<u32> {
        self.cells
            .iter()
            .flat_map(|cell| cell.region.surfaces())
            .map(|surface| surface.surface_id)
            .collect()
    }
}
