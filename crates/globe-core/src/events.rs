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

//! Natural event markers (wildfires, storms, volcanoes).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::projection::{CartesianPoint, GeoCoordinate};

/// An open natural event with a point location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalEvent {
    pub id: String,
    pub title: String,
    pub category: String,
    pub coordinate: GeoCoordinate,
}

/// An event placed in scene space.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMarker {
    pub id: String,
    pub title: String,
    pub category: String,
    pub position: CartesianPoint,
}

impl NaturalEvent {
    #[must_use]
    pub fn marker(&self, radius: f64) -> EventMarker {
        EventMarker {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            position: self.coordinate.to_cartesian(radius),
        }
    }
}

/// Count events per category, sorted by category name.
#[must_use]
pub fn count_by_category(events: &[NaturalEvent]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.category.as_str()).or_insert(0) += 1;
    }
    counts
}
