//! Turntable registry: fixed slot table indexed by handle
//!
//! Lookups (audio thread) index straight into a preallocated slot array and
//! never allocate or wait on a lock. Creation and deletion (control thread)
//! serialize on a small occupancy table and swap whole slots, so the audio
//! thread either sees the complete turntable or an empty slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use basedrop::{Handle, Shared, SharedCell};

use super::gc::gc_handle;
use super::turntable::{Turntable, TurntableHandle};
use crate::error::{DscratchError, DscratchResult};
use crate::types::MAX_TURNTABLES;

/// Arena of live turntables
pub struct TurntableRegistry {
    slots: Box<[SharedCell<Option<Turntable>>]>,
    /// Occupancy, only read/written by create/delete
    occupied: Mutex<Vec<bool>>,
    live: AtomicUsize,
    gc: Handle,
}

impl TurntableRegistry {
    pub fn new(capacity: usize) -> Self {
        let gc = gc_handle();
        let slots = (0..capacity)
            .map(|_| SharedCell::new(Shared::new(&gc, None)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            occupied: Mutex::new(vec![false; capacity]),
            live: AtomicUsize::new(0),
            gc,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live turntables
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a turntable in the smallest free slot
    ///
    /// Nothing is registered if `build` fails.
    pub fn insert<F>(&self, build: F) -> DscratchResult<TurntableHandle>
    where
        F: FnOnce(TurntableHandle) -> DscratchResult<Turntable>,
    {
        let mut occupied = self.lock_occupied();
        let index = occupied
            .iter()
            .position(|used| !used)
            .ok_or(DscratchError::RegistryFull {
                capacity: self.capacity(),
            })?;

        let handle = TurntableHandle::new(index);
        let turntable = build(handle)?;
        self.slots[index].set(Shared::new(&self.gc, Some(turntable)));
        occupied[index] = true;
        self.live.fetch_add(1, Ordering::Release);
        Ok(handle)
    }

    /// Delete a live turntable; deleting a free slot is an error
    pub fn remove(&self, handle: TurntableHandle) -> DscratchResult<()> {
        let mut occupied = self.lock_occupied();
        match occupied.get_mut(handle.index()) {
            Some(used) if *used => {
                // Readers still holding the old turntable keep it alive;
                // it is freed on the collector thread
                self.slots[handle.index()].set(Shared::new(&self.gc, None));
                *used = false;
                self.live.fetch_sub(1, Ordering::Release);
                Ok(())
            }
            _ => Err(DscratchError::InvalidHandle(handle)),
        }
    }

    /// Run `f` on the turntable behind `handle`
    pub fn with<R, F>(&self, handle: TurntableHandle, f: F) -> DscratchResult<R>
    where
        F: FnOnce(&Turntable) -> R,
    {
        let slot = self
            .slots
            .get(handle.index())
            .ok_or(DscratchError::InvalidHandle(handle))?;
        let current = slot.get();
        match &*current {
            Some(turntable) => Ok(f(turntable)),
            None => Err(DscratchError::InvalidHandle(handle)),
        }
    }

    /// Handles of all live turntables, in ascending order
    pub fn handles(&self) -> Vec<TurntableHandle> {
        self.lock_occupied()
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(index, _)| TurntableHandle::new(index))
            .collect()
    }

    fn lock_occupied(&self) -> MutexGuard<'_, Vec<bool>> {
        self.occupied.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TurntableRegistry {
    fn default() -> Self {
        Self::new(MAX_TURNTABLES)
    }
}

impl std::fmt::Debug for TurntableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurntableRegistry")
            .field("capacity", &self.capacity())
            .field("live", &self.len())
            .finish()
    }
}
