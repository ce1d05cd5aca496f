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

use std::sync::Arc;

use tokio::sync::mpsc;

use super::{
    ApplyResult, LookupOutcome, LookupResult, Phase, SelectionMachine, SelectionState,
    SelectionTicket, WeatherSnapshot,
};
use crate::projection::{unproject, CartesianPoint, GeoCoordinate};
use crate::LookupFuture;

/// The two lookups triggered by a selection.
///
/// Returned futures must be `'static`; implementations typically clone a
/// cheap client handle into the future.
pub trait Lookups: Send + Sync + 'static {
    fn weather(&self, coordinate: GeoCoordinate) -> LookupFuture<WeatherSnapshot>;

    fn place_name(&self, coordinate: GeoCoordinate) -> LookupFuture<String>;
}

/// Turns clicks into lookups and merges their results.
///
/// Lookups run as spawned tasks and report back over a channel. The state is
/// only mutated by [`process_next`](Self::process_next) and
/// [`drain_ready`](Self::drain_ready), on whichever task owns the
/// coordinator.
pub struct InteractionCoordinator<L> {
    lookups: Arc<L>,
    machine: SelectionMachine,
    outcome_tx: mpsc::UnboundedSender<LookupOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<LookupOutcome>,
}

impl<L> std::fmt::Debug for InteractionCoordinator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionCoordinator")
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl<L: Lookups> InteractionCoordinator<L> {
    #[must_use]
    pub fn new(lookups: Arc<L>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            lookups,
            machine: SelectionMachine::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Select the globe point under the pointer.
    pub fn select_point(&mut self, point: CartesianPoint) -> SelectionTicket {
        self.select_coordinate(unproject(point))
    }

    /// Select a coordinate and launch both lookups.
    pub fn select_coordinate(&mut self, coordinate: GeoCoordinate) -> SelectionTicket {
        let ticket = self.machine.begin(coordinate);

        let weather = self.lookups.weather(coordinate);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = LookupResult::Weather(weather.await);
            let _ = tx.send(LookupOutcome { ticket, result });
        });

        let place = self.lookups.place_name(coordinate);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = LookupResult::PlaceName(place.await);
            let _ = tx.send(LookupOutcome { ticket, result });
        });

        ticket
    }

    /// Clear the selection. In-flight lookups keep running but their
    /// results are dropped.
    pub fn dismiss(&mut self) {
        self.machine.dismiss();
    }

    /// Wait for the next lookup result and merge it.
    ///
    /// Pending forever when nothing is in flight, which makes it suitable
    /// as a `tokio::select!` branch.
    pub async fn process_next(&mut self) -> Option<ApplyResult> {
        let outcome = self.outcome_rx.recv().await?;
        Some(self.machine.apply(outcome))
    }

    /// Merge every result that has already arrived. Returns how many were applied.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if self.machine.apply(outcome) == ApplyResult::Applied {
                applied += 1;
            }
        }
        applied
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        self.machine.state()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// The active selection, if any.
    #[must_use]
    pub fn active(&self) -> Option<SelectionTicket> {
        self.machine.active()
    }
}
