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

//! Selection state for a clicked point on the globe.
//!
//! Selecting a point starts two independent lookups (weather and place name).
//! Each result is merged into [`SelectionState`] as it arrives, in either
//! order. Every selection carries a generation number, and results tagged
//! with an older generation are dropped, so a slow response can never
//! repopulate a dismissed or superseded selection.

mod coordinator;

pub use coordinator::{InteractionCoordinator, Lookups};

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::projection::GeoCoordinate;

/// Place name shown when reverse geocoding fails or finds no country.
pub const UNKNOWN_PLACE: &str = "Unknown Country";

/// Minimum number of forecast days in a weather snapshot.
pub const MIN_FORECAST_DAYS: usize = 3;

/// One day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    /// WMO weather interpretation code.
    pub condition_code: u8,
}

/// Current conditions plus a short daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current_temperature_c: f64,
    pub current_wind_kph: f64,
    /// WMO weather interpretation code.
    pub current_condition_code: u8,
    pub daily_forecast: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    /// Build a snapshot, rejecting forecasts shorter than [`MIN_FORECAST_DAYS`].
    pub fn new(
        current_temperature_c: f64,
        current_wind_kph: f64,
        current_condition_code: u8,
        daily_forecast: Vec<DailyForecast>,
    ) -> Result<Self, LookupError> {
        if daily_forecast.len() < MIN_FORECAST_DAYS {
            return Err(LookupError::Parse(format!(
                "expected at least {MIN_FORECAST_DAYS} forecast days, got {}",
                daily_forecast.len()
            )));
        }
        Ok(Self {
            current_temperature_c,
            current_wind_kph,
            current_condition_code,
            daily_forecast,
        })
    }

    /// Human-readable description of the current conditions.
    #[must_use]
    pub fn description(&self) -> &'static str {
        describe_condition(self.current_condition_code)
    }
}

/// Convert a WMO weather code to a human-readable description.
#[must_use]
pub fn describe_condition(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 => "Snow",
        77 => "Snow grains",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

/// Resolved weather field of a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherReport {
    Available(WeatherSnapshot),
    /// The lookup failed; the panel shows a placeholder.
    Unavailable,
}

/// What the info panel displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub coordinate: Option<GeoCoordinate>,
    pub weather: Option<WeatherReport>,
    pub place_name: Option<String>,
}

/// Coarse state of the selection, derived from [`SelectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingLookups,
    Populated,
}

impl SelectionState {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match (&self.coordinate, &self.weather, &self.place_name) {
            (None, _, _) => Phase::Idle,
            (Some(_), Some(_), Some(_)) => Phase::Populated,
            _ => Phase::AwaitingLookups,
        }
    }
}

/// Identity of one selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionTicket {
    pub generation: u64,
    pub coordinate: GeoCoordinate,
}

/// Result of a single lookup, delivered back to the owner.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Weather(Result<WeatherSnapshot, LookupError>),
    PlaceName(Result<String, LookupError>),
}

/// A lookup result tagged with the selection it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    pub ticket: SelectionTicket,
    pub result: LookupResult,
}

/// What happened to an outcome handed to [`SelectionMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// Merged into the current selection.
    Applied,
    /// Belonged to a dismissed or superseded selection and was dropped.
    Stale,
}

/// Synchronous selection state machine.
///
/// Owns the [`SelectionState`] and the generation counter. Async plumbing
/// lives in [`InteractionCoordinator`].
#[derive(Debug, Default)]
pub struct SelectionMachine {
    state: SelectionState,
    generation: u64,
    active: Option<SelectionTicket>,
}

impl SelectionMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new selection, superseding any previous one.
    pub fn begin(&mut self, coordinate: GeoCoordinate) -> SelectionTicket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = SelectionTicket {
            generation: self.generation,
            coordinate,
        };
        self.state = SelectionState {
            coordinate: Some(coordinate),
            weather: None,
            place_name: None,
        };
        self.active = Some(ticket);
        info!("Selected {} (generation {})", coordinate, ticket.generation);
        ticket
    }

    /// Merge one lookup result if it belongs to the active selection.
    pub fn apply(&mut self, outcome: LookupOutcome) -> ApplyResult {
        if self.active != Some(outcome.ticket) {
            debug!(
                "Dropping stale lookup result for generation {}",
                outcome.ticket.generation
            );
            return ApplyResult::Stale;
        }

        match outcome.result {
            LookupResult::Weather(Ok(snapshot)) => {
                self.state.weather = Some(WeatherReport::Available(snapshot));
            }
            LookupResult::Weather(Err(e)) => {
                warn!("Weather lookup failed for {}: {}", outcome.ticket.coordinate, e);
                self.state.weather = Some(WeatherReport::Unavailable);
            }
            LookupResult::PlaceName(Ok(name)) => {
                self.state.place_name = Some(name);
            }
            LookupResult::PlaceName(Err(e)) => {
                warn!("Place lookup failed for {}: {}", outcome.ticket.coordinate, e);
                self.state.place_name = Some(UNKNOWN_PLACE.to_string());
            }
        }
        ApplyResult::Applied
    }

    /// Clear the selection. Outstanding lookups become stale.
    pub fn dismiss(&mut self) {
        if self.active.take().is_some() {
            info!("Selection dismissed");
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = SelectionState::default();
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// The active selection, if any.
    #[must_use]
    pub fn active(&self) -> Option<SelectionTicket> {
        self.active
    }
}
