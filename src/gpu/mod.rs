//! GPU resources behind the streaming pipeline.
//!
//! Provides per-plane texture/sampler management and the persistently
//! mapped transfer slots that decouple CPU frame writes from GPU reads.

/// Per-plane texture, view, sampler, and bind group resources.
pub mod planes;
/// Persistently mapped double-buffered transfer slots.
pub mod staging;
