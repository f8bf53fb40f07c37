//! Task slot allocation over a queue's occupancy bitmap
//!
//! Bit `i` of byte `b` tracks slot `8 * b + i`, least significant bit first.
//! A set bit means the slot holds a live task.
//!
//! The bitmap is a snapshot. Another submitter may claim the same slot before
//! our transaction lands; the queue program rejects the loser, which should
//! re-read the queue and try again.

/// Lowest free slot in `bitmap`, or `None` when every slot is taken.
///
/// Slots past `u16::MAX` cannot be addressed by a task id and count as taken.
pub fn next_available_task_id(bitmap: &[u8]) -> Option<u16> {
    bitmap
        .iter()
        .enumerate()
        .find(|(_, &byte)| byte != 0xFF)
        .map(|(byte_idx, &byte)| byte_idx * 8 + (!byte).trailing_zeros() as usize)
        .and_then(|slot| u16::try_from(slot).ok())
}

/// Number of slots currently in use
pub fn occupied_slots(bitmap: &[u8]) -> usize {
    bitmap.iter().map(|&b| b.count_ones() as usize).sum()
}
