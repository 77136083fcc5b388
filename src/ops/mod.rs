// ============================================================================
// OPERATIONS — pixel-level passes over the layer stack
// ============================================================================

pub mod adjustments;
pub mod filters;
pub mod transform;
