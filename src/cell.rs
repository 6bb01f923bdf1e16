use crate::region::Region;
use crate::surface::Surface;
use std::sync::Arc;

/// A Cell is a geometric region particles stream through. Cells here are
/// void: no fill material, no collisions. The surfaces bounding the
/// region are where everything interesting happens - boundary conditions
/// and surface-source banking.
#[derive(Clone)]
pub struct Cell {
    pub cell_id: u32,
    pub name: Option<String>,
    pub region: Region,
}

impl Cell {
    pub fn new(cell_id: u32, region: Region, name: Option<String>) -> Self {
        Cell {
            cell_id,
            name,
            region,
        }
    }

    /// Check if a point is inside this cell's region
    pub fn contains(&self, point: (f64, f64, f64)) -> bool {
        self.region.contains(point)
    }

    /// Find the closest surface of this cell along a direction, and the
    /// distance to it. First intersection with any region surface wins.
    pub fn closest_surface(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
    ) -> Option<(Arc<Surface>, f64)> {
        let mut min_dist = f64::INFINITY;
        let mut closest: Option<Arc<Surface>> = None;
        for surface_arc in self.region.surfaces() {
            if let Some(dist) = surface_arc.distance_to_surface(point, direction) {
                if dist > 1e-10 && dist < min_dist {
                    min_dist = dist;
                    closest = Some(surface_arc);
                }
            }
        }
        closest.map(|surface| (surface, min_dist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::HalfspaceType;

    fn sphere_cell(radius: f64, surface_id: u32, cell_id: u32) -> Cell {
        let sphere = Arc::new(Surface::new_sphere(0.0, 0.0, 0.0, radius, surface_id, None));
        let region = Region::new_from_halfspace(HalfspaceType::Below(sphere));
        Cell::new(cell_id, region, None)
    }

    #[test]
    fn test_contains() {
        let cell = sphere_cell(2.0, 1, 1);
        assert!(cell.contains((0.0, 0.0, 0.0)));
        assert!(!cell.contains((3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_closest_surface_in_sphere() {
        let cell = sphere_cell(2.0, 7, 1);
        let (surface, dist) = cell
            .closest_surface([0.0, 0.0, 0.0], [0.0, 0.0, 1.0])
            .expect("ray from center must hit the sphere");
        assert_eq!(surface.surface_id, 7);
        assert!((dist - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_closest_surface_picks_nearest() {
        // Shell between r=1 and r=2, ray pointing outward from r=1.5
        let inner = Arc::new(Surface::new_sphere(0.0, 0.0, 0.0, 1.0, 1, None));
        let outer = Arc::new(Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 2, None));
        let region = Region::new_from_halfspace(HalfspaceType::Above(inner))
            .intersection(&Region::new_from_halfspace(HalfspaceType::Below(outer)));
        let cell = Cell::new(1, region, None);

        let (surface, dist) = cell
            .closest_surface([1.5, 0.0, 0.0], [1.0, 0.0, 0.0])
            .expect("outward ray must hit the outer sphere");
        assert_eq!(surface.surface_id, 2);
        assert!((dist - 0.5).abs() < 1e-10);

        // Inward ray hits the inner sphere first
        let (surface, dist) = cell
            .closest_surface([1.5, 0.0, 0.0], [-1.0, 0.0, 0.0])
            .expect("inward ray must hit the inner sphere");
        assert_eq!(surface.surface_id, 1);
        assert!((dist - 0.5).abs() < 1e-10);
    }
}
