// ============================================================================
// ADJUSTMENT SESSION — non-destructive preview over a snapshot
// ============================================================================

use image::RgbaImage;

use crate::canvas::CanvasState;
use crate::ops::adjustments::apply_adjustments;

/// One open preview scope over the layer that was active at start.
///
/// Every preview is recomputed from the snapshot taken at start, never from
/// the previous preview, so repeated calls with different slider values do
/// not accumulate. Consuming the session (commit or cancel) closes it.
pub struct AdjustmentSession {
    layer_index: usize,
    snapshot: RgbaImage,
}

impl AdjustmentSession {
    /// Snapshot the active layer. Returns `None` when there is no active
    /// layer to scope the session to.
    pub fn start(state: &CanvasState) -> Option<Self> {
        let layer_index = state.active_layer_index?;
        let snapshot = state.layers.get(layer_index)?.pixels.clone();
        Some(Self { layer_index, snapshot })
    }

    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    /// Recompute the layer from the snapshot with the given slider values.
    /// A vanished layer index (stack edited behind our back) is a no-op.
    pub fn preview(
        &self,
        state: &mut CanvasState,
        brightness: f32,
        contrast: f32,
        saturation: f32,
        hue: f32,
    ) {
        if let Some(layer) = state.layers.get_mut(self.layer_index) {
            layer.pixels = apply_adjustments(&self.snapshot, brightness, contrast, saturation, hue);
        }
    }

    /// Keep whatever the last preview produced and discard the snapshot.
    pub fn commit(self, state: &mut CanvasState) {
        state.mark_modified();
    }

    /// Restore the layer to the snapshot and discard it.
    pub fn cancel(self, state: &mut CanvasState) {
        if let Some(layer) = state.layers.get_mut(self.layer_index) {
            layer.pixels = self.snapshot;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn state_with_layer() -> CanvasState {
        let mut img = RgbaImage::new(6, 6);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 40) as u8, (y * 40) as u8, 120, 255]);
        }
        let mut state = CanvasState::new();
        state.add_layer(img, "Background".into());
        state
    }

    #[test]
    fn start_requires_an_active_layer() {
        let state = CanvasState::new();
        assert!(AdjustmentSession::start(&state).is_none());
        assert!(AdjustmentSession::start(&state_with_layer()).is_some());
    }

    #[test]
    fn previews_rebase_on_the_snapshot() {
        let mut state = state_with_layer();
        let original = state.layers[0].pixels.clone();
        let session = AdjustmentSession::start(&state).unwrap();

        session.preview(&mut state, 80.0, 0.0, 0.0, 0.0);
        session.preview(&mut state, 20.0, 0.0, 0.0, 0.0);

        // same result as a single direct application of the last values
        let expected = apply_adjustments(&original, 20.0, 0.0, 0.0, 0.0);
        assert_eq!(state.layers[0].pixels, expected);
    }

    #[test]
    fn zero_preview_restores_the_snapshot_exactly() {
        let mut state = state_with_layer();
        let original = state.layers[0].pixels.clone();
        let session = AdjustmentSession::start(&state).unwrap();

        session.preview(&mut state, -60.0, 30.0, 0.0, 90.0);
        session.preview(&mut state, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(state.layers[0].pixels, original);
    }

    #[test]
    fn cancel_restores_and_commit_keeps() {
        let mut state = state_with_layer();
        let original = state.layers[0].pixels.clone();

        let session = AdjustmentSession::start(&state).unwrap();
        session.preview(&mut state, 50.0, 0.0, 0.0, 0.0);
        session.cancel(&mut state);
        assert_eq!(state.layers[0].pixels, original);

        let session = AdjustmentSession::start(&state).unwrap();
        session.preview(&mut state, 50.0, 0.0, 0.0, 0.0);
        let previewed = state.layers[0].pixels.clone();
        session.commit(&mut state);
        assert_eq!(state.layers[0].pixels, previewed);
        assert!(state.modified);
        assert_ne!(state.layers[0].pixels, original);
    }

    #[test]
    fn preview_survives_layer_removal() {
        let mut state = state_with_layer();
        let session = AdjustmentSession::start(&state).unwrap();
        state.remove_layer(0);
        // layer gone: preview and cancel must not panic or resurrect it
        session.preview(&mut state, 10.0, 0.0, 0.0, 0.0);
        assert!(state.layers.is_empty());
    }
}
