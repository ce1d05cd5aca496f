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

//! Core state for an interactive globe client.
//!
//! This library holds everything a globe front end needs besides drawing:
//!
//! - **Projection**: latitude/longitude to sphere points and back
//! - **Poller**: periodic refresh of an external resource with a single
//!   in-flight fetch and stale-value retention
//! - **Selection**: click-to-lookups coordination with late-result guarding
//! - **Tracker**: satellite ground-track history
//! - **Events** and **Overlay**: event markers and info-panel dragging
//!
//! # Polling
//!
//! ```no_run
//! use std::time::Duration;
//! use globe_core::{LookupError, Poller, PollerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = PollerConfig::new("clock", Duration::from_secs(2)).unwrap();
//!     let poller = Poller::spawn(config, || async { Ok::<_, LookupError>(42) });
//!
//!     let mut updates = poller.subscribe();
//!     while updates.changed().await.is_ok() {
//!         println!("{:?}", updates.borrow().last_value);
//!     }
//! }
//! ```
//!
//! # Projection
//!
//! ```
//! use globe_core::projection::{project, unproject, GeoCoordinate};
//!
//! let paris = GeoCoordinate::new(48.8566, 2.3522).unwrap();
//! let point = project(paris, 1.0);
//! let back = unproject(point.scaled(10.0));
//! assert!((back.latitude - paris.latitude).abs() < 1e-9);
//! ```

pub mod error;
pub mod events;
pub mod overlay;
pub mod poller;
pub mod projection;
pub mod selection;
pub mod tracker;

use std::future::Future;
use std::pin::Pin;

pub use error::{CoordinateError, LookupError, PollerError};
pub use events::{EventMarker, NaturalEvent};
pub use overlay::{DragState, ScreenPos};
pub use poller::{PollState, Poller, PollerConfig, TickOutcome};
pub use projection::{project, unproject, CartesianPoint, GeoCoordinate};
pub use selection::{
    ApplyResult, DailyForecast, InteractionCoordinator, Lookups, Phase, SelectionState,
    SelectionTicket, WeatherReport, WeatherSnapshot, UNKNOWN_PLACE,
};
pub use tracker::{SatellitePosition, SatelliteTrack, TrackPoint};

/// Boxed future produced by an external lookup.
pub type LookupFuture<T> = Pin<Box<dyn Future<Output = Result<T, LookupError>> + Send>>;
