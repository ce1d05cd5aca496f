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

//! Drag handling for the floating info panel.

/// Screen-space position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Panel drag sub-state machine.
///
/// `pointer_down` grabs the panel, `pointer_move` drags it, `pointer_up`
/// drops it at its new offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Resting {
        offset: ScreenPos,
    },
    Dragging {
        /// Panel offset when the drag started.
        origin: ScreenPos,
        /// Pointer position when the drag started.
        grab: ScreenPos,
        /// Current panel offset.
        offset: ScreenPos,
    },
}

impl Default for DragState {
    fn default() -> Self {
        Self::Resting {
            offset: ScreenPos::default(),
        }
    }
}

impl DragState {
    #[must_use]
    pub fn offset(&self) -> ScreenPos {
        match *self {
            Self::Resting { offset } | Self::Dragging { offset, .. } => offset,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    #[must_use]
    pub fn pointer_down(self, pointer: ScreenPos) -> Self {
        match self {
            Self::Resting { offset } => Self::Dragging {
                origin: offset,
                grab: pointer,
                offset,
            },
            dragging @ Self::Dragging { .. } => dragging,
        }
    }

    /// Ignored unless a drag is in progress.
    #[must_use]
    pub fn pointer_move(self, pointer: ScreenPos) -> Self {
        match self {
            Self::Dragging { origin, grab, .. } => Self::Dragging {
                origin,
                grab,
                offset: ScreenPos::new(origin.x + pointer.x - grab.x, origin.y + pointer.y - grab.y),
            },
            resting @ Self::Resting { .. } => resting,
        }
    }

    #[must_use]
    pub fn pointer_up(self) -> Self {
        Self::Resting {
            offset: self.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_moves_panel() {
        let state = DragState::default()
            .pointer_down(ScreenPos::new(100.0, 100.0))
            .pointer_move(ScreenPos::new(130.0, 90.0));
        assert!(state.is_dragging());
        assert_eq!(state.offset(), ScreenPos::new(30.0, -10.0));

        let state = state.pointer_up();
        assert!(!state.is_dragging());
        assert_eq!(state.offset(), ScreenPos::new(30.0, -10.0));

        // A second drag starts from the dropped offset.
        let state = state
            .pointer_down(ScreenPos::new(0.0, 0.0))
            .pointer_move(ScreenPos::new(5.0, 5.0))
            .pointer_up();
        assert_eq!(state.offset(), ScreenPos::new(35.0, -5.0));
    }

    #[test]
    fn test_move_without_grab_is_ignored() {
        let state = DragState::default().pointer_move(ScreenPos::new(50.0, 50.0));
        assert_eq!(state, DragState::default());
    }
}
