//! Shared region between the two instances
//!
//! - `layout`: fixed `#[repr(C)]` structure and field offsets
//! - `store`: mapping, snapshots, flushed writes and atomic control fields

pub mod layout;
pub mod store;

pub use layout::{MAGIC, NO_OWNER, STATE_SIZE, SharedState};
pub use store::{RegionStatus, SharedStateStore};
