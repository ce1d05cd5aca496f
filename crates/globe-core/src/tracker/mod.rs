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

//! Satellite position and ground-track history.
//!
//! Positions arrive from a [`Poller`](crate::poller::Poller); the track keeps
//! a trail of recent samples for drawing behind the satellite marker.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::projection::{CartesianPoint, GeoCoordinate};

const EARTH_RADIUS_KM: f64 = 6371.0;
const POSITION_CHANGE_THRESHOLD_DEGREES: f64 = 0.001;

/// Great-circle distance between two coordinates in kilometres (haversine).
#[must_use]
pub fn haversine_distance_km(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// One reading from the satellite position service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatellitePosition {
    pub coordinate: GeoCoordinate,
    pub altitude_km: f64,
    pub velocity_kph: f64,
    pub timestamp: DateTime<Utc>,
}

/// A sample in the ground track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub coordinate: GeoCoordinate,
    pub altitude_km: f64,
    pub timestamp: DateTime<Utc>,
}

/// Bounded ground-track history for one satellite.
#[derive(Debug, Clone)]
pub struct SatelliteTrack {
    points: VecDeque<TrackPoint>,
    retention: Duration,
}

impl SatelliteTrack {
    /// Keep samples no older than `retention_secs` relative to the newest sample.
    ///
    /// Retentions too large for a `chrono::Duration` keep everything.
    #[must_use]
    pub fn new(retention_secs: u64) -> Self {
        let retention = i64::try_from(retention_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            points: VecDeque::new(),
            retention,
        }
    }

    /// Record a position. Returns `false` when it was too close to the last
    /// sample (or older than it) to be worth keeping.
    pub fn record(&mut self, position: &SatellitePosition) -> bool {
        if let Some(last) = self.points.back() {
            if position.timestamp <= last.timestamp {
                return false;
            }
            let dlat = position.coordinate.latitude - last.coordinate.latitude;
            let dlon = position.coordinate.longitude - last.coordinate.longitude;
            if (dlat * dlat + dlon * dlon).sqrt() <= POSITION_CHANGE_THRESHOLD_DEGREES {
                return false;
            }
        }

        self.points.push_back(TrackPoint {
            coordinate: position.coordinate,
            altitude_km: position.altitude_km,
            timestamp: position.timestamp,
        });
        self.prune(position.timestamp);
        true
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let before = self.points.len();
        while self
            .points
            .front()
            .is_some_and(|p| now - p.timestamp > self.retention)
        {
            self.points.pop_front();
        }
        let removed = before - self.points.len();
        if removed > 0 {
            debug!("Pruned {removed} ground-track points");
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TrackPoint> {
        self.points.back()
    }

    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total ground distance covered by the stored trail, in kilometres.
    #[must_use]
    pub fn ground_distance_km(&self) -> f64 {
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(a, b)| haversine_distance_km(a.coordinate, b.coordinate))
            .sum()
    }

    /// Trail positions on a globe of `radius`, lifted by altitude.
    ///
    /// `altitude_scale` converts kilometres into scene units above the surface.
    #[must_use]
    pub fn polyline(&self, radius: f64, altitude_scale: f64) -> Vec<CartesianPoint> {
        self.points
            .iter()
            .map(|p| p.coordinate.to_cartesian(radius + p.altitude_km * altitude_scale))
            .collect()
    }
}
