//! Fixed layout of the shared region
//!
//! Both instances map the same bytes and must agree on every offset, so the
//! structure is `#[repr(C)]`, padding-free (`Pod`) and never versioned. A
//! sentinel mismatch means "never initialized", nothing more.
//!
//! The control fields (`heartbeat`, `active_owner`, `transfer_request`) are
//! plain integers here but are only ever accessed through atomics once the
//! region is live; see [`super::store`].

use std::mem::{align_of, offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::sim::GameRecord;

/// Sentinel marking an initialized region
pub const MAGIC: u32 = 0x1234_5678;

/// `active_owner` value when nobody holds the Active role
pub const NO_OWNER: u32 = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SharedState {
    /// Bumped by the Active instance at a fixed cadence
    pub heartbeat: u64,
    pub magic: u32,
    /// Process id of the Active instance, or [`NO_OWNER`]
    pub active_owner: u32,
    /// 1 while the Active instance is handing over control
    pub transfer_request: u32,
    pub reserved: u32,
    pub game: GameRecord,
}

impl SharedState {
    pub fn is_initialized(&self) -> bool {
        self.magic == MAGIC
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}

pub const STATE_SIZE: usize = size_of::<SharedState>();
pub const STATE_ALIGN: usize = align_of::<SharedState>();

pub const HEARTBEAT_OFFSET: usize = offset_of!(SharedState, heartbeat);
pub const MAGIC_OFFSET: usize = offset_of!(SharedState, magic);
pub const OWNER_OFFSET: usize = offset_of!(SharedState, active_owner);
pub const TRANSFER_OFFSET: usize = offset_of!(SharedState, transfer_request);
pub const GAME_OFFSET: usize = offset_of!(SharedState, game);
pub const GAME_SIZE: usize = size_of::<GameRecord>();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_BODY_LEN;

    #[test]
    fn test_offsets_are_fixed() {
        assert_eq!(HEARTBEAT_OFFSET, 0);
        assert_eq!(MAGIC_OFFSET, 8);
        assert_eq!(OWNER_OFFSET, 12);
        assert_eq!(TRANSFER_OFFSET, 16);
        assert_eq!(GAME_OFFSET, 24);
        assert_eq!(GAME_SIZE, 40 + 8 * MAX_BODY_LEN);
        assert_eq!(STATE_SIZE, GAME_OFFSET + GAME_SIZE);
        assert_eq!(STATE_ALIGN, 8);
    }

    #[test]
    fn test_atomic_fields_naturally_aligned() {
        assert_eq!(HEARTBEAT_OFFSET % 8, 0);
        assert_eq!(OWNER_OFFSET % 4, 0);
        assert_eq!(TRANSFER_OFFSET % 4, 0);
    }
}
