//! Camera-angle math.
//!
//! The whole world rotates as the puzzle's core mechanic, so the character
//! juggles three coordinate spaces:
//!
//! - **unrotated**: camera-independent storage space for airborne positions,
//! - **world**: unrotated space with the camera rotation applied (what airborne
//!   integration runs in),
//! - **screen-projected**: the space platform positions are reported in, used
//!   for the landing intersection query.
//!
//! All angles in this crate are degrees; the helpers below keep the trig
//! readable at the call sites that mirror the tuned animation tables.

use bevy::prelude::*;

/// Sine of an angle given in degrees.
#[inline]
pub fn sin_deg(degrees: f32) -> f32 {
    degrees.to_radians().sin()
}

/// Cosine of an angle given in degrees.
#[inline]
pub fn cos_deg(degrees: f32) -> f32 {
    degrees.to_radians().cos()
}

/// Angle in degrees between a vector and the up axis `(0, 1, 0)`.
///
/// Returns `NaN` for a zero vector; callers treat non-finite pose input as
/// "no new information".
#[inline]
pub fn angle_with_up(v: Vec3) -> f32 {
    (v.y / v.length()).acos().to_degrees()
}

/// The camera rotation applied to the whole world, in degrees.
///
/// `x` tilts about the world X axis, `y` spins about the world Y axis.
/// [`apply`](CameraAngle::apply) and [`invert`](CameraAngle::invert) are exact
/// inverses; [`project`](CameraAngle::project) matches the display transform
/// and is what the world graph's intersection query expects.
///
/// ```
/// use grid_character_controller::prelude::*;
/// use bevy::math::Vec3;
///
/// let angle = CameraAngle { x: 30.0, y: 45.0 };
/// let v = Vec3::new(1.0, 2.0, 3.0);
/// let roundtrip = angle.invert(angle.apply(v));
/// assert!((roundtrip - v).length() < 1e-4);
/// ```
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Resource)]
pub struct CameraAngle {
    /// Rotation about the world X axis, degrees.
    pub x: f32,
    /// Rotation about the world Y axis, degrees.
    pub y: f32,
}

fn rotate_x(degrees: f32, v: Vec3) -> Vec3 {
    let (s, c) = (sin_deg(degrees), cos_deg(degrees));
    Vec3::new(v.x, v.y * c - v.z * s, v.y * s + v.z * c)
}

fn rotate_y(degrees: f32, v: Vec3) -> Vec3 {
    let (s, c) = (sin_deg(degrees), cos_deg(degrees));
    Vec3::new(v.x * c + v.z * s, v.y, -v.x * s + v.z * c)
}

impl CameraAngle {
    /// A fixed camera looking straight at the unrotated world.
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0 };

    /// Create an angle from its two components, in degrees.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Rotate an unrotated-space point into world space (X rotation, then Y).
    pub fn apply(&self, v: Vec3) -> Vec3 {
        rotate_y(self.y, rotate_x(self.x, v))
    }

    /// Rotate a world-space point back into unrotated storage space.
    ///
    /// Exact inverse of [`apply`](Self::apply).
    pub fn invert(&self, v: Vec3) -> Vec3 {
        rotate_x(-self.x, rotate_y(-self.y, v))
    }

    /// Project a world-space point into the screen-projected space the
    /// platform set lives in (negated rotations, X first).
    pub fn project(&self, v: Vec3) -> Vec3 {
        rotate_y(-self.y, rotate_x(-self.x, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn degree_trig_matches_known_values() {
        assert_relative_eq!(sin_deg(90.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(cos_deg(180.0), -1.0, epsilon = 1e-6);
        assert_relative_eq!(sin_deg(30.0), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn apply_then_invert_is_identity() {
        let angle = CameraAngle::new(37.5, -112.0);
        let v = Vec3::new(-4.2, 9.0, 0.75);
        let roundtrip = angle.invert(angle.apply(v));
        assert!((roundtrip - v).length() < 1e-4);
    }

    #[test]
    fn identity_angle_leaves_points_alone() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(CameraAngle::IDENTITY.apply(v), v);
        assert_eq!(CameraAngle::IDENTITY.project(v), v);
    }

    #[test]
    fn angle_with_up_of_vertical_is_zero() {
        assert_relative_eq!(angle_with_up(Vec3::Y * 3.0), 0.0, epsilon = 1e-4);
        assert_relative_eq!(angle_with_up(Vec3::X), 90.0, epsilon = 1e-4);
    }
}
