#[derive(Clone, Debug, PartialEq)]
pub enum BoundaryType {
    Transmission,
    Vacuum,
}

impl Default for BoundaryType {
    fn default() -> Self {
        BoundaryType::Transmission
    }
}

impl BoundaryType {
    /// Parse a boundary type from a string, returning None for invalid strings
    pub fn from_str_option(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "transmission" => Some(BoundaryType::Transmission),
            "vacuum" => Some(BoundaryType::Vacuum),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Surface {
    pub surface_id: u32,
    pub kind: SurfaceKind,
    pub boundary_type: BoundaryType,
}

#[derive(Clone, Debug)]
pub enum SurfaceKind {
    Plane {
        a: f64,
        b: f64,
        c: f64,
        d: f64,
    },
    Sphere {
        x0: f64,
        y0: f64,
        z0: f64,
        radius: f64,
    },
    Cylinder {
        axis: [f64; 3],
        origin: [f64; 3],
        radius: f64,
    },
}

impl Surface {
    pub fn new_plane(
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        surface_id: u32,
        boundary_type: Option<BoundaryType>,
    ) -> Self {
        Surface {
            surface_id,
            kind: SurfaceKind::Plane { a, b, c, d },
            boundary_type: boundary_type.unwrap_or_default(),
        }
    }

    pub fn new_sphere(
        x0: f64,
        y0: f64,
        z0: f64,
        radius: f64,
        surface_id: u32,
        boundary_type: Option<BoundaryType>,
    ) -> Self {
        Surface {
            surface_id,
            kind: SurfaceKind::Sphere { x0, y0, z0, radius },
            boundary_type: boundary_type.unwrap_or_default(),
        }
    }

    pub fn new_cylinder(
        axis: [f64; 3],
        origin: [f64; 3],
        radius: f64,
        surface_id: u32,
        boundary_type: Option<BoundaryType>,
    ) -> Self {
        Surface {
            surface_id,
            kind: SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            },
            boundary_type: boundary_type.unwrap_or_default(),
        }
    }

    pub fn x_plane(x0: f64, surface_id: u32, boundary_type: Option<BoundaryType>) -> Self {
        Self::new_plane(1.0, 0.0, 0.0, x0, surface_id, boundary_type)
    }

    pub fn y_plane(y0: f64, surface_id: u32, boundary_type: Option<BoundaryType>) -> Self {
        Self::new_plane(0.0, 1.0, 0.0, y0, surface_id, boundary_type)
    }

    pub fn z_plane(z0: f64, surface_id: u32, boundary_type: Option<BoundaryType>) -> Self {
        Self::new_plane(0.0, 0.0, 1.0, z0, surface_id, boundary_type)
    }

    /// Create a cylinder oriented along the Z axis, centered at (x0, y0)
    pub fn z_cylinder(
        x0: f64,
        y0: f64,
        radius: f64,
        surface_id: u32,
        boundary_type: Option<BoundaryType>,
    ) -> Self {
        Self::new_cylinder(
            [0.0, 0.0, 1.0],
            [x0, y0, 0.0],
            radius,
            surface_id,
            boundary_type,
        )
    }

    /// Compute the distance from a point along a direction to the surface.
    /// Returns Some(distance) if intersection exists and distance > 0, else None.
    pub fn distance_to_surface(&self, point: [f64; 3], direction: [f64; 3]) -> Option<f64> {
        match &self.kind {
            SurfaceKind::Plane { a, b, c, d } => {
                // Plane: ax + by + cz - d = 0
                let denom = a * direction[0] + b * direction[1] + c * direction[2];
                if denom.abs() < 1e-12 {
                    // Parallel, no intersection
                    return None;
                }
                let num = d - (a * point[0] + b * point[1] + c * point[2]);
                let t = num / denom;
                if t > 1e-12 {
                    Some(t)
                } else {
                    None
                }
            }
            SurfaceKind::Sphere { x0, y0, z0, radius } => {
                // Ray-sphere intersection: (p + t*v - c)·(p + t*v - c) = r^2
                let oc = [point[0] - x0, point[1] - y0, point[2] - z0];
                let a = direction[0] * direction[0]
                    + direction[1] * direction[1]
                    + direction[2] * direction[2];
                let b = 2.0 * (oc[0] * direction[0] + oc[1] * direction[1] + oc[2] * direction[2]);
                let c = oc[0] * oc[0] + oc[1] * oc[1] + oc[2] * oc[2] - radius * radius;
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                let t1 = (-b - sqrt_disc) / (2.0 * a);
                let t2 = (-b + sqrt_disc) / (2.0 * a);
                // Return the smallest positive t
                if t1 > 1e-12 {
                    Some(t1)
                } else if t2 > 1e-12 {
                    Some(t2)
                } else {
                    None
                }
            }
            SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            } => {
                // Ray intersection with an infinite cylinder:
                // ((p-c) - ((p-c)·a)a)^2 = r^2 along p + t*v
                let v_dot_a =
                    direction[0] * axis[0] + direction[1] * axis[1] + direction[2] * axis[2];
                let d = [
                    direction[0] - v_dot_a * axis[0],
                    direction[1] - v_dot_a * axis[1],
                    direction[2] - v_dot_a * axis[2],
                ];
                let delta_p = [
                    point[0] - origin[0],
                    point[1] - origin[1],
                    point[2] - origin[2],
                ];
                let dp_dot_a = delta_p[0] * axis[0] + delta_p[1] * axis[1] + delta_p[2] * axis[2];
                let m = [
                    delta_p[0] - dp_dot_a * axis[0],
                    delta_p[1] - dp_dot_a * axis[1],
                    delta_p[2] - dp_dot_a * axis[2],
                ];
                let a_c = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
                let b_c = 2.0 * (d[0] * m[0] + d[1] * m[1] + d[2] * m[2]);
                let c_c = m[0] * m[0] + m[1] * m[1] + m[2] * m[2] - radius * radius;
                let disc = b_c * b_c - 4.0 * a_c * c_c;
                if disc < 0.0 || a_c.abs() < 1e-12 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                let t1 = (-b_c - sqrt_disc) / (2.0 * a_c);
                let t2 = (-b_c + sqrt_disc) / (2.0 * a_c);
                if t1 > 1e-12 {
                    Some(t1)
                } else if t2 > 1e-12 {
                    Some(t2)
                } else {
                    None
                }
            }
        }
    }

    /// Evaluate the surface equation at a point: negative inside/below,
    /// positive outside/above
    pub fn evaluate(&self, point: (f64, f64, f64)) -> f64 {
        match &self.kind {
            SurfaceKind::Plane { a, b, c, d } => a * point.0 + b * point.1 + c * point.2 - d,
            SurfaceKind::Sphere { x0, y0, z0, radius } => {
                let dx = point.0 - x0;
                let dy = point.1 - y0;
                let dz = point.2 - z0;
                (dx * dx + dy * dy + dz * dz).sqrt() - radius
            }
            SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            } => {
                let v = [point.0 - origin[0], point.1 - origin[1], point.2 - origin[2]];
                let dot = v[0] * axis[0] + v[1] * axis[1] + v[2] * axis[2];
                let d = [
                    v[0] - dot * axis[0],
                    v[1] - dot * axis[1],
                    v[2] - dot * axis[2],
                ];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt() - radius
            }
        }
    }

    /// Get the boundary type of the surface
    pub fn boundary_type(&self) -> &BoundaryType {
        &self.boundary_type
    }

    /// Set the boundary type of the surface
    pub fn set_boundary_type(&mut self, boundary_type: BoundaryType) {
        self.boundary_type = boundary_type;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_creation() {
        let plane = Surface::new_plane(1.0, 0.0, 0.0, 2.0, 42, None);
        match plane.kind {
            SurfaceKind::Plane { a, b, c, d } => {
                assert_eq!(a, 1.0);
                assert_eq!(b, 0.0);
                assert_eq!(c, 0.0);
                assert_eq!(d, 2.0);
            }
            _ => panic!("Not a plane"),
        }
        assert_eq!(plane.surface_id, 42);
    }

    #[test]
    fn test_sphere_creation() {
        let sphere = Surface::new_sphere(1.0, 2.0, 3.0, 5.0, 7, None);
        match sphere.kind {
            SurfaceKind::Sphere { x0, y0, z0, radius } => {
                assert_eq!(x0, 1.0);
                assert_eq!(y0, 2.0);
                assert_eq!(z0, 3.0);
                assert_eq!(radius, 5.0);
            }
            _ => panic!("Not a sphere"),
        }
        assert_eq!(sphere.surface_id, 7);
    }

    #[test]
    fn test_z_cylinder_creation() {
        let zcyl = Surface::z_cylinder(1.0, 2.0, 3.0, 123, None);
        match zcyl.kind {
            SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            } => {
                assert_eq!(axis, [0.0, 0.0, 1.0]);
                assert_eq!(origin, [1.0, 2.0, 0.0]);
                assert_eq!(radius, 3.0);
            }
            _ => panic!("Not a Z cylinder"),
        }
        assert_eq!(zcyl.surface_id, 123);
    }

    #[test]
    fn test_boundary_type_default() {
        let plane = Surface::new_plane(1.0, 0.0, 0.0, 2.0, 42, None);
        assert_eq!(*plane.boundary_type(), BoundaryType::Transmission);
    }

    #[test]
    fn test_set_boundary_type() {
        let mut sphere = Surface::new_sphere(0.0, 0.0, 0.0, 1.0, 1, None);
        sphere.set_boundary_type(BoundaryType::Vacuum);
        assert_eq!(*sphere.boundary_type(), BoundaryType::Vacuum);
    }

    #[test]
    fn test_sphere_distance() {
        let sphere = Surface::new_sphere(0.0, 0.0, 0.0, 1.0, 1, None);
        // From (2,0,0) toward center
        let d = sphere.distance_to_surface([2.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        assert!((d.unwrap() - 1.0).abs() < 1e-10);
        // From the center outward
        let d2 = sphere.distance_to_surface([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!((d2.unwrap() - 1.0).abs() < 1e-10);
        // No intersection
        let d3 = sphere.distance_to_surface([2.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_eq!(d3, None);
    }

    #[test]
    fn test_plane_distance() {
        let plane = Surface::x_plane(5.0, 1, None);
        let d = plane.distance_to_surface([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_eq!(d, Some(5.0));
        // Moving away
        let d2 = plane.distance_to_surface([0.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        assert_eq!(d2, None);
        // Parallel direction
        let d3 = plane.distance_to_surface([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(d3, None);
    }

    #[test]
    fn test_cylinder_distance() {
        let cyl = Surface::z_cylinder(0.0, 0.0, 1.0, 1, None);
        let d = cyl.distance_to_surface([2.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        assert!((d.unwrap() - 1.0).abs() < 1e-10);
        let d2 = cyl.distance_to_surface([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!((d2.unwrap() - 1.0).abs() < 1e-10);
        let d3 = cyl.distance_to_surface([2.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_eq!(d3, None);
    }

    #[test]
    fn test_sphere_evaluate_sign() {
        let sphere = Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 1, None);
        assert!(sphere.evaluate((0.0, 0.0, 0.0)) < 0.0);
        assert!(sphere.evaluate((3.0, 0.0, 0.0)) > 0.0);
        assert!(sphere.evaluate((2.0, 0.0, 0.0)).abs() < 1e-12);
    }
}
