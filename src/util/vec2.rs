use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Distance floor used before any `delta / distance` division
pub const EPSILON: f32 = 1e-4;

/// 2D vector in world space (x right, y down)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: -1.0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector, or zero when the vector is shorter than `EPSILON`
    pub fn normalize(&self) -> Self {
        self.normalize_or(Self::ZERO)
    }

    /// Unit vector, or `fallback` when the vector is shorter than `EPSILON`
    pub fn normalize_or(&self, fallback: Vec2) -> Self {
        let len = self.length();
        if len > EPSILON {
            *self * (1.0 / len)
        } else {
            fallback
        }
    }

    /// Returns the direction and the raw length. The divisor is floored at
    /// `EPSILON`, so coincident points yield a zero direction instead of NaN.
    pub fn normalize_with_length(&self) -> (Self, f32) {
        let len = self.length();
        (*self * (1.0 / len.max(EPSILON)), len)
    }

    #[inline]
    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn distance_to(&self, other: Vec2) -> f32 {
        (*self - other).length()
    }

    #[inline]
    pub fn distance_sq_to(&self, other: Vec2) -> f32 {
        (*self - other).length_sq()
    }

    pub fn clamp_length(&self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            *self * (max / len)
        } else {
            *self
        }
    }

    pub fn lerp(&self, other: Vec2, t: f32) -> Self {
        *self + (other - *self) * t
    }

    /// Returns perpendicular vector (rotated 90 degrees counter-clockwise)
    pub fn perpendicular(&self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Reflects vector off surface with given normal
    pub fn reflect(&self, normal: Vec2) -> Self {
        *self - normal * (2.0 * self.dot(normal))
    }

    /// Returns angle in radians
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Check if vector is approximately equal to another
    pub fn approx_eq(&self, other: Vec2, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;
    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self * rhs.x,
            y: self * rhs.y,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const TOLERANCE: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_length() {
        let v = Vec2::new(3.0, 4.0);
        assert!(approx_eq(v.length(), 5.0));
        assert!(approx_eq(v.length_sq(), 25.0));
    }

    #[test]
    fn test_normalize() {
        let n = Vec2::new(3.0, 4.0).normalize();
        assert!(approx_eq(n.length(), 1.0));
        assert!(approx_eq(n.x, 0.6));
        assert!(approx_eq(n.y, 0.8));
    }

    #[test]
    fn test_normalize_coincident_points_is_finite() {
        let a = Vec2::new(10.0, 10.0);
        let delta = a - a;
        assert_eq!(delta.normalize(), Vec2::ZERO);
        assert_eq!(delta.normalize_or(Vec2::RIGHT), Vec2::RIGHT);

        let (dir, len) = delta.normalize_with_length();
        assert!(dir.is_finite());
        assert_eq!(len, 0.0);
    }

    #[test]
    fn test_normalize_with_length_tiny_vector() {
        // Below the floor: direction is scaled down, never blown up
        let (dir, _) = Vec2::new(1e-7, 0.0).normalize_with_length();
        assert!(dir.is_finite());
        assert!(dir.length() <= 1.0);
    }

    #[test]
    fn test_clamp_length() {
        let clamped = Vec2::new(6.0, 8.0).clamp_length(5.0);
        assert!(approx_eq(clamped.length(), 5.0));
        assert!(approx_eq(clamped.x, 3.0));

        let untouched = Vec2::new(3.0, 4.0).clamp_length(10.0);
        assert_eq!(untouched, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_lerp() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 10.0);
        assert!(a.lerp(b, 0.5).approx_eq(Vec2::new(5.0, 5.0), TOLERANCE));
        assert!(a.lerp(b, 1.0).approx_eq(b, TOLERANCE));
    }

    #[test]
    fn test_perpendicular() {
        let v = Vec2::new(1.0, 0.0);
        let p = v.perpendicular();
        assert!(approx_eq(p.y, 1.0));
        assert!(approx_eq(v.dot(p), 0.0));
    }

    #[test]
    fn test_reflect() {
        let v = Vec2::new(1.0, -1.0).normalize();
        let reflected = v.reflect(Vec2::new(0.0, 1.0));
        assert!(approx_eq(reflected.x, v.x));
        assert!(approx_eq(reflected.y, -v.y));
    }

    #[test]
    fn test_from_angle_and_angle() {
        let v = Vec2::from_angle(PI / 2.0);
        assert!(approx_eq(v.x, 0.0));
        assert!(approx_eq(v.y, 1.0));
        assert!(approx_eq(Vec2::new(-1.0, 0.0).angle(), PI));
    }

    #[test]
    fn test_operators() {
        let mut a = Vec2::new(1.0, 2.0);
        a += Vec2::new(3.0, 4.0);
        assert_eq!(a, Vec2::new(4.0, 6.0));
        a -= Vec2::new(1.0, 1.0);
        assert_eq!(a, Vec2::new(3.0, 5.0));
        a *= 2.0;
        assert_eq!(a, Vec2::new(6.0, 10.0));
        assert_eq!(-a, Vec2::new(-6.0, -10.0));
        assert_eq!(0.5 * a, Vec2::new(3.0, 5.0));
    }

    #[test]
    fn test_serde() {
        let v = Vec2::new(1.5, 2.5);
        let encoded = serde_json::to_string(&v).unwrap();
        let decoded: Vec2 = serde_json::from_str(&encoded).unwrap();
        assert_eq!(v, decoded);
    }
}
