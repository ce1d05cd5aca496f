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

//! Error types shared by the lookup, polling and projection layers.

use thiserror::Error;

/// Failure of an external lookup (weather, place name, events, satellite).
///
/// None of these are fatal. The poller keeps its last good value and the
/// selection coordinator substitutes a display sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The request failed or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The lookup succeeded but yielded no usable data.
    #[error("not found: {0}")]
    NotFound(String),
}

impl LookupError {
    /// Short lowercase name of the error kind, for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// Invalid latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("coordinate is not finite")]
    NotFinite,
}

/// Invalid poller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollerError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}
