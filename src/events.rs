// ============================================================================
// EDITOR EVENTS — state-change notifications for the presentation layer
// ============================================================================

use std::collections::VecDeque;

/// Emitted by the editor after state changes. The host drains the queue once
/// per frame and reacts (repaint, retitle, re-enable actions); the core never
/// calls back into the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorEvent {
    ImageLoaded,
    ImageModified,
    ZoomChanged,
    CropModeEntered,
    CropModeExited,
    AdjustmentModeEntered,
    AdjustmentModeExited,
    LayerAdded,
    LayerRemoved,
    LayerMoved,
    ActiveLayerChanged,
}

#[derive(Default)]
pub struct EventQueue {
    events: VecDeque<EditorEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: EditorEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = EditorEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
