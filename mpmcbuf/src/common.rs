// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Common internal types and utilities for mpmcbuf.

use crate::sync::{AtomicUsize, UnsafeCell};
use crate::MpmcBufError;
use std::mem::MaybeUninit;

/// Smallest capacity the slot sequencing scheme supports. With a single slot
/// the "consumed" stamp of lap `n` equals the "published" stamp of lap `n + 1`.
pub(crate) const MIN_CAPACITY: usize = 2;

#[inline]
#[cold]
fn cold() {}

#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if !b {
        cold();
    }
    b
}

#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}

/// One cell of the ring.
///
/// `sequence` encodes the slot state relative to a queue position `pos`
/// mapping onto it: `pos` means free for the producer claiming `pos`,
/// `pos + 1` means published for the consumer claiming `pos`.
pub(crate) struct Slot<T> {
    pub(crate) sequence: AtomicUsize,
    pub(crate) value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(sequence: usize) -> Self {
        Slot {
            sequence: AtomicUsize::new(sequence),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

pub(crate) fn round_capacity(requested: usize) -> Result<usize, MpmcBufError> {
    if requested == 0 {
        return Err(MpmcBufError::ZeroCapacity);
    }
    requested
        .max(MIN_CAPACITY)
        .checked_next_power_of_two()
        .ok_or(MpmcBufError::CapacityOverflow(requested))
}
