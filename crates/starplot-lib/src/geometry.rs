//! Vector arithmetic over catalog coordinates.
//!
//! All positions are expressed in light-years. [`Point3D`] doubles as a
//! position and a displacement vector, mirroring how the plotter reasons
//! about "current position plus range along the travel direction".

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cartesian coordinates (or a displacement) in light-years.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// Squared Euclidean distance; preferred for comparisons.
    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Length of this point treated as a vector.
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn unit(&self) -> Option<Self> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(*self * (1.0 / length))
    }

    /// Linear interpolation: `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// Point on the infinite line through `a` and `b` closest to `self`.
    ///
    /// Degenerates to `a` when both line points coincide.
    pub fn nearest_point_on_line(&self, a: &Self, b: &Self) -> Self {
        let direction = *b - *a;
        let length_squared = direction.dot(&direction);
        if length_squared == 0.0 {
            return *a;
        }
        let t = (*self - *a).dot(&direction) / length_squared;
        *a + direction * t
    }

    /// Perpendicular distance from `self` to the line through `a` and `b`.
    pub fn deviation_from_line(&self, a: &Self, b: &Self) -> f64 {
        self.distance_to(&self.nearest_point_on_line(a, b))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Positions closer than `epsilon` light-years are the same place.
    pub fn same_place(&self, other: &Self, epsilon: f64) -> bool {
        self.distance_squared_to(other) <= epsilon * epsilon
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Self) -> Self::Output {
        Point3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Self) -> Self::Output {
        Point3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, rhs: f64) -> Self::Output {
        Point3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(value: [f64; 3]) -> Self {
        Point3D::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2},{:.2},{:.2}", self.x, self.y, self.z)
    }
}

/// Error returned when a `x,y,z` triple cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePointError(String);

impl fmt::Display for ParsePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected coordinates as x,y,z but got '{}'", self.0)
    }
}

impl std::error::Error for ParsePointError {}

impl FromStr for Point3D {
    type Err = ParsePointError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ParsePointError(s.to_string()));
        }
        let mut values = [0.0; 3];
        for (slot, part) in values.iter_mut().zip(parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|_| ParsePointError(s.to_string()))?;
        }
        let point = Point3D::from(values);
        if !point.is_finite() {
            return Err(ParsePointError(s.to_string()));
        }
        Ok(point)
    }
}
