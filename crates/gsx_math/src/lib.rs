// Re-export glam for convenience
pub use glam::*;

// GSX math types
mod aabb;
mod interval;
pub use aabb::Aabb;
pub use interval::Interval;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec4_from_array_keeps_order() {
        let q = Vec4::from_array([0.0, 0.0, 0.0, 1.0]);
        assert_eq!(q.w, 1.0);
        assert_eq!(q.to_array(), [0.0, 0.0, 0.0, 1.0]);
    }
}
