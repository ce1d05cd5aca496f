// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Latitude/longitude to sphere mapping.
//!
//! The globe is centered at the origin with the north pole along +Y.
//! Longitude is offset by 180 degrees so that longitude 0 lands on +X,
//! which is where the equirectangular earth texture puts its seam.
//!
//! ```text
//! phi   = (90 - lat)   in radians
//! theta = (lon + 180)  in radians
//! x = -r sin(phi) cos(theta)
//! y =  r cos(phi)
//! z =  r sin(phi) sin(theta)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// Horizontal magnitude (relative to the unit vector) below which a point
/// is treated as sitting on a pole.
const POLE_EPSILON: f64 = 1e-12;

/// A position on the earth in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude in degrees, -90 (south) to 90 (north).
    pub latitude: f64,
    /// Longitude in degrees, -180 (west) to 180 (east).
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Project onto a sphere of the given radius.
    #[must_use]
    pub fn to_cartesian(self, radius: f64) -> CartesianPoint {
        project(self, radius)
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{} {:.4}°{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

/// A point in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance from the origin.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Multiply every component by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Unit vector in the same direction, or `None` for the origin and
    /// non-finite points.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let magnitude = self.magnitude();
        if magnitude == 0.0 || !magnitude.is_finite() {
            return None;
        }
        Some(self.scaled(1.0 / magnitude))
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Map a coordinate onto a sphere of `radius` centered at the origin.
#[must_use]
pub fn project(coord: GeoCoordinate, radius: f64) -> CartesianPoint {
    let phi = (90.0 - coord.latitude).to_radians();
    let theta = (coord.longitude + 180.0).to_radians();

    CartesianPoint {
        x: -radius * phi.sin() * theta.cos(),
        y: radius * phi.cos(),
        z: radius * phi.sin() * theta.sin(),
    }
}

/// Recover the coordinate of a point on (or radially projected onto) the globe.
///
/// The point is normalized first, so any radius works. At the poles
/// longitude is undefined and reported as 0. The origin maps to (0, 0).
#[must_use]
pub fn unproject(point: CartesianPoint) -> GeoCoordinate {
    let Some(unit) = point.normalized() else {
        return GeoCoordinate {
            latitude: 0.0,
            longitude: 0.0,
        };
    };

    let latitude = 90.0 - unit.y.clamp(-1.0, 1.0).acos().to_degrees();

    let horizontal = unit.x.hypot(unit.z);
    let longitude = if horizontal < POLE_EPSILON {
        0.0
    } else {
        let theta = unit.z.atan2(-unit.x).to_degrees();
        wrap_longitude(theta - 180.0)
    };

    GeoCoordinate {
        latitude,
        longitude,
    }
}

/// Wrap any longitude into [-180, 180).
fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}
