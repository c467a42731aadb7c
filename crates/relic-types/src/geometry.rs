//! World-space geometry: points, vectors, block positions and facing angles.
//!
//! Angles follow the world's yaw convention: 0 degrees faces `+z`, 90 degrees
//! faces `-x`. Every facing angle handed to the world is normalized into the
//! half-open range `(-180, 180]` with [`normalize_degrees`].

use serde::{Deserialize, Serialize};

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// East-west coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl Point {
    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Return this point shifted by the given offsets.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
    }

    /// The block containing this point.
    pub fn block(self) -> BlockPos {
        BlockPos::new(floor_to_i64(self.x), floor_to_i64(self.y), floor_to_i64(self.z))
    }
}

/// A movement (velocity) vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    /// East-west component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
    /// North-south component.
    pub z: f64,
}

impl Vector {
    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared magnitude, including the vertical component.
    pub fn length_squared(self) -> f64 {
        self.x.mul_add(self.x, self.y.mul_add(self.y, self.z * self.z))
    }

    /// Horizontal heading of this vector in degrees, using the world's yaw
    /// convention (`atan2(-x, z)`). Not normalized.
    #[allow(clippy::cast_possible_truncation)]
    pub fn heading_degrees(self) -> f32 {
        // Yaw is stored as f32 by the world; precision loss is irrelevant here.
        (-self.x).atan2(self.z).to_degrees() as f32
    }
}

/// Integer coordinates of a single world block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west block coordinate.
    pub x: i64,
    /// Vertical block coordinate.
    pub y: i64,
    /// North-south block coordinate.
    pub z: i64,
}

impl BlockPos {
    /// Create a block position from its coordinates.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Return this position shifted by the given block offsets, saturating at
    /// the coordinate range.
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }
}

/// Where a participant stands and which way they look.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Position of the participant's feet.
    pub position: Point,
    /// Look direction (yaw) in degrees.
    pub yaw: f32,
}

impl Location {
    /// Create a location from a position and a look yaw.
    pub const fn new(position: Point, yaw: f32) -> Self {
        Self { position, yaw }
    }
}

/// Normalize an angle in degrees into `(-180, 180]`.
///
/// Non-finite input maps to `0.0`.
pub fn normalize_degrees(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs;
    // the branch below folds that back to 0.0.
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[allow(clippy::cast_possible_truncation)]
fn floor_to_i64(value: f64) -> i64 {
    // `as` saturates at the i64 range and maps NaN to 0.
    value.floor() as i64
}
