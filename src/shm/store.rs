//! Memory-mapped shared state store
//!
//! ## Safety invariants
//!
//! 1. **Layout**: the mapping is exactly [`STATE_SIZE`] bytes starting at the
//!    caller's offset, and [`SharedState`] is `#[repr(C)]` + `Pod`, so any
//!    byte pattern is a valid value.
//! 2. **Alignment**: `open` rejects offsets that are not a multiple of
//!    [`STATE_ALIGN`]; mappings start on a page boundary plus that offset, so
//!    every field is naturally aligned.
//! 3. **Atomics**: `heartbeat`, `active_owner` and `transfer_request` are only
//!    accessed through `AtomicU64`/`AtomicU32` views while the store is live.
//!    Plain-memory access is limited to the game record (`write`) and whole
//!    snapshots (`read`), which never overlap an atomic access in this process.
//!
//! There is no lock over the region. The other process may write at any time;
//! the role protocol tolerates torn snapshots of the game record.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use memmap2::{MmapMut, MmapOptions};

use super::layout::*;
use crate::error::{Error, Result};
use crate::sim::GameRecord;

/// What `open` found in the region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    /// Sentinel matched; previous state kept
    Existing,
    /// Sentinel missing; region was zero-filled and stamped
    Reinitialized,
}

pub struct SharedStateStore {
    map: MmapMut,
    path: PathBuf,
}

impl SharedStateStore {
    /// Map the shared structure at `offset` in `path`.
    ///
    /// Regular files are created and extended as needed; devices are mapped
    /// as they are. Initialization on sentinel mismatch is not atomic: two
    /// instances racing here may both zero-fill.
    pub fn open(path: impl AsRef<Path>, offset: u64) -> Result<(Self, RegionStatus)> {
        let path = path.as_ref();
        if offset % STATE_ALIGN as u64 != 0 {
            return Err(Error::Argument(format!(
                "offset {offset:#x} is not a multiple of {STATE_ALIGN}"
            )));
        }
        let required = region_end(offset)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        let meta = file.metadata().map_err(|e| Error::io(path, e))?;
        if meta.is_file() && meta.len() < required {
            log::info!("Extending {} to {} bytes", path.display(), required);
            file.set_len(required).map_err(|e| Error::io(path, e))?;
        }

        // SAFETY: the mapping length is fixed to STATE_SIZE and the file stays
        // mapped for the life of the store; concurrent writers are the other
        // instance, which the protocol accounts for.
        let map = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(STATE_SIZE)
                .map_mut(&file)
        }
        .map_err(|e| Error::io(path, e))?;

        let mut store = Self {
            map,
            path: path.to_path_buf(),
        };
        let status = store.ensure_initialized();
        log::info!(
            "Mapped {} bytes of {} at {offset:#x} ({status:?})",
            STATE_SIZE,
            path.display()
        );
        Ok((store, status))
    }

    /// Copy the structure at `offset` without joining: nothing is created,
    /// extended, zero-filled or written. A regular file too short to hold the
    /// region reads as uninitialized.
    pub fn inspect(path: impl AsRef<Path>, offset: u64) -> Result<SharedState> {
        let path = path.as_ref();
        if offset % STATE_ALIGN as u64 != 0 {
            return Err(Error::Argument(format!(
                "offset {offset:#x} is not a multiple of {STATE_ALIGN}"
            )));
        }
        let required = region_end(offset)?;

        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let meta = file.metadata().map_err(|e| Error::io(path, e))?;
        if meta.is_file() && meta.len() < required {
            log::info!(
                "{} is {} bytes, region ends at {}; nothing stored",
                path.display(),
                meta.len(),
                required
            );
            return Ok(SharedState::default());
        }

        // SAFETY: read-only mapping of STATE_SIZE bytes, copied out immediately
        // and dropped before returning.
        let map = unsafe { MmapOptions::new().offset(offset).len(STATE_SIZE).map(&file) }
            .map_err(|e| Error::io(path, e))?;
        Ok(bytemuck::pod_read_unaligned(&map[..STATE_SIZE]))
    }

    /// Private anonymous region, for single-instance use and tests
    pub fn anonymous() -> Result<Self> {
        let map = MmapOptions::new()
            .len(STATE_SIZE)
            .map_anon()
            .map_err(|e| Error::io("<anonymous>", e))?;
        let mut store = Self {
            map,
            path: PathBuf::from("<anonymous>"),
        };
        store.ensure_initialized();
        Ok(store)
    }

    fn ensure_initialized(&mut self) -> RegionStatus {
        if self.read().is_initialized() {
            return RegionStatus::Existing;
        }
        log::warn!(
            "No valid sentinel in {}, zero-initializing shared state",
            self.path.display()
        );
        self.map.fill(0);
        self.map[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&MAGIC.to_ne_bytes());
        self.flush();
        RegionStatus::Reinitialized
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the whole structure; control fields come from atomic loads
    pub fn read(&self) -> SharedState {
        let mut state: SharedState = bytemuck::pod_read_unaligned(&self.map[..STATE_SIZE]);
        state.heartbeat = self.heartbeat();
        state.active_owner = self.active_owner();
        state.transfer_request = self.atomic_u32(TRANSFER_OFFSET).load(Ordering::Acquire);
        state
    }

    /// Mutate the game record in place, then flush
    pub fn write<R>(&mut self, mutate: impl FnOnce(&mut GameRecord) -> R) -> R {
        let record: &mut GameRecord =
            bytemuck::from_bytes_mut(&mut self.map[GAME_OFFSET..GAME_OFFSET + GAME_SIZE]);
        let result = mutate(record);
        self.flush();
        result
    }

    /// Best-effort sync to the backing medium
    pub fn flush(&self) {
        if let Err(e) = self.map.flush() {
            log::warn!("Flush of {} failed: {}", self.path.display(), e);
        }
    }

    fn atomic_u64(&self, offset: usize) -> &AtomicU64 {
        // SAFETY: offset is a field offset inside the mapping, 8-byte aligned
        // (invariant 2), and only accessed atomically (invariant 3).
        unsafe { AtomicU64::from_ptr(self.map.as_ptr().add(offset) as *mut u64) }
    }

    fn atomic_u32(&self, offset: usize) -> &AtomicU32 {
        // SAFETY: as for atomic_u64, with 4-byte alignment.
        unsafe { AtomicU32::from_ptr(self.map.as_ptr().add(offset) as *mut u32) }
    }

    pub fn heartbeat(&self) -> u64 {
        self.atomic_u64(HEARTBEAT_OFFSET).load(Ordering::Acquire)
    }

    /// Increment the heartbeat, returning the new value
    pub fn bump_heartbeat(&self) -> u64 {
        let value = self
            .atomic_u64(HEARTBEAT_OFFSET)
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        self.flush();
        value
    }

    pub fn active_owner(&self) -> u32 {
        self.atomic_u32(OWNER_OFFSET).load(Ordering::Acquire)
    }

    pub fn set_active_owner(&self, id: u32) {
        self.atomic_u32(OWNER_OFFSET).store(id, Ordering::Release);
        self.flush();
    }

    /// Clear the owner field only if it still names `id`
    pub fn release_owner(&self, id: u32) -> bool {
        let released = self
            .atomic_u32(OWNER_OFFSET)
            .compare_exchange(id, NO_OWNER, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.flush();
        released
    }

    pub fn transfer_requested(&self) -> bool {
        self.atomic_u32(TRANSFER_OFFSET).load(Ordering::Acquire) != 0
    }

    pub fn request_transfer(&self) {
        self.atomic_u32(TRANSFER_OFFSET).store(1, Ordering::Release);
        self.flush();
    }

    /// Clear a pending transfer request; true only for the caller that
    /// actually cleared it
    pub fn take_transfer_request(&self) -> bool {
        let taken = self
            .atomic_u32(TRANSFER_OFFSET)
            .compare_exchange(1, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if taken {
            self.flush();
        }
        taken
    }

    pub fn clear_transfer_request(&self) {
        self.atomic_u32(TRANSFER_OFFSET).store(0, Ordering::Release);
        self.flush();
    }
}

/// End of the region in the backing file
fn region_end(offset: u64) -> Result<u64> {
    offset
        .checked_add(STATE_SIZE as u64)
        .ok_or_else(|| Error::Argument(format!("offset {offset:#x} leaves no room for the region")))
}

impl Drop for SharedStateStore {
    fn drop(&mut self) {
        self.flush();
        log::debug!("Unmapping {}", self.path.display());
    }
}
