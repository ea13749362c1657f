//! The batch-and-debounce intake pipeline.
//!
//! Everything between "a file appeared" and "the file sits in its
//! terminal location": debounced scheduling, deterministic enumeration,
//! identifier resolution, upload, relocation and pruning.

pub mod batch;
pub mod debounce;
pub mod error;
pub mod path;
pub mod relocate;
pub mod resolver;
pub mod scan;
pub mod state;

pub use crate::batch::Pipeline;
pub use crate::debounce::{BatchRunner, DebounceScheduler};
pub use crate::resolver::{IdentifierResolver, Resolution};
pub use crate::state::StateFile;
