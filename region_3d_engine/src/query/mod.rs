//! Query composition: broad-phase index retrieval narrowed by exact
//! region geometry, plus the per-tick transition sweep.

pub mod query_engine;
pub mod transition;

pub use query_engine::QueryEngine;
pub use transition::{RegionTransition, TransitionKind, TransitionMask};
