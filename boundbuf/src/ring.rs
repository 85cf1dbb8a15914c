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

//! Fixed-capacity slot storage with no synchronization of its own.

use crate::BoundBufError;

/// Circular array of `capacity` slots.
///
/// `head` is the next slot to read and `tail` the next slot to write. Both
/// advance modulo the capacity, so any capacity `>= 1` is accepted, not only
/// powers of two. Storage is allocated once and never resized.
pub struct RingSlots<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> RingSlots<T> {
    pub fn with_capacity(capacity: usize) -> Result<Self, BoundBufError> {
        if capacity == 0 {
            return Err(BoundBufError::ZeroCapacity);
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|source| BoundBufError::Allocation { capacity, source })?;
        slots.resize_with(capacity, || None);

        Ok(RingSlots {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            len: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Writes `value` at `tail`. Hands the value back when every slot is occupied.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }

        self.slots[self.tail] = Some(value);
        self.tail = self.advance(self.tail);
        self.len += 1;
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// The value written by the latest successful `push`, if still present.
    pub fn newest(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let capacity = self.capacity();
        self.slots[(self.tail + capacity - 1) % capacity].as_ref()
    }

    /// Reads the value at `head`, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = self.slots[self.head].take();
        debug_assert!(value.is_some(), "occupied slot {} was empty", self.head);
        self.head = self.advance(self.head);
        self.len -= 1;
        debug_assert!(self.is_consistent());
        value
    }

    #[inline(always)]
    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    /// `0 <= len <= capacity` and `tail == (head + len) mod capacity`.
    pub(crate) fn is_consistent(&self) -> bool {
        let capacity = self.capacity();
        self.len <= capacity
            && self.head < capacity
            && self.tail < capacity
            && self.tail == (self.head + self.len) % capacity
    }
}
