// SPDX-License-Identifier: GPL-3.0-only

//! Bounded pool of frame slots
//!
//! Cameras copy each captured payload into a slot they own and hand the slot
//! out until the caller releases it. A full pool means no frame can be
//! delivered, which the polling loop treats as "not ready".

use super::types::{FrameData, FrameId};
use crate::errors::{CameraError, CameraResult};

#[derive(Debug)]
struct Slot {
    data: FrameData,
    in_use: bool,
}

/// Fixed set of reusable frame buffers
#[derive(Debug)]
pub struct SlotPool {
    slots: Vec<Slot>,
    sequence: u64,
}

impl SlotPool {
    pub fn new(count: usize) -> Self {
        let slots = (0..count)
            .map(|_| Slot {
                data: FrameData::default(),
                in_use: false,
            })
            .collect();
        Self { slots, sequence: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently checked out
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    /// Frames delivered so far, which is also the next frame's sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Take the first free slot, or `None` if every slot is checked out
    ///
    /// The slot must end in either [`SlotPool::deliver`] or
    /// [`SlotPool::abandon`].
    pub fn checkout(&mut self) -> Option<(FrameId, FrameData)> {
        let (index, slot) = self.slots.iter_mut().enumerate().find(|(_, s)| !s.in_use)?;
        slot.in_use = true;
        Some((FrameId(index), slot.data.clone()))
    }

    /// Mark a filled slot as handed out and assign its sequence number
    pub fn deliver(&mut self, id: FrameId) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    /// Return a slot taken by a frame that was never delivered
    pub fn abandon(&mut self, id: FrameId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.in_use = false;
        }
    }

    /// Hand a delivered frame's slot back
    pub fn release(&mut self, id: FrameId) -> CameraResult<()> {
        match self.slots.get_mut(id.0) {
            Some(slot) if slot.in_use => {
                slot.in_use = false;
                Ok(())
            }
            Some(_) => Err(CameraError::InvalidFormat(format!(
                "frame slot {} is not checked out",
                id.0
            ))),
            None => Err(CameraError::InvalidFormat(format!(
                "frame slot {} does not belong to this camera",
                id.0
            ))),
        }
    }

    /// Invalidate every outstanding frame
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.in_use = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_checkout_until_full() {
        let mut pool = SlotPool::new(2);
        let (a, _) = pool.checkout().unwrap();
        let (b, _) = pool.checkout().unwrap();
        assert_ne!(a, b);
        assert_eq!((pool.deliver(a), pool.deliver(b)), (0, 1));
        assert!(pool.checkout().is_none());
        assert_eq!(pool.in_use(), 2);

        pool.release(a).unwrap();
        let (c, _) = pool.checkout().unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.deliver(c), 2);
    }

    #[test]
    fn test_abandoned_slot_leaves_no_sequence_gap() {
        let mut pool = SlotPool::new(2);
        let (a, _) = pool.checkout().unwrap();
        assert_eq!(pool.deliver(a), 0);
        for _ in 0..3 {
            let (empty, _) = pool.checkout().unwrap();
            pool.abandon(empty);
        }
        assert_eq!(pool.in_use(), 1);
        let (b, _) = pool.checkout().unwrap();
        assert_eq!(pool.deliver(b), 1);
        assert_eq!(pool.sequence(), 2);
    }

    #[test]
    fn test_release_unknown_slot() {
        let mut pool = SlotPool::new(1);
        assert_eq!(
            pool.release(FrameId(0)).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            pool.release(FrameId(5)).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_slot_storage_is_reused() {
        let mut pool = SlotPool::new(1);
        let (id, data) = pool.checkout().unwrap();
        data.replace(vec![1, 2, 3]);
        pool.release(id).unwrap();
        let (_, again) = pool.checkout().unwrap();
        assert!(again.ptr_eq(&data));
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_reset_frees_everything() {
        let mut pool = SlotPool::new(3);
        while pool.checkout().is_some() {}
        pool.reset();
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.capacity(), 3);
    }
}
