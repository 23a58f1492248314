//! Slot+generation handle table.
//!
//! A destroyed handle keeps its slot index but carries an old generation,
//! so presenting it again resolves to `None` instead of aliasing whatever
//! buffer reused the slot. Double-destroy is therefore a safe, detectable
//! no-op.

use std::fmt;

/// Opaque, non-owning reference to a registered buffer.
///
/// Encoding: upper 32 bits = slot index, lower 32 bits = generation. The
/// raw `u64` is what crosses the C boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    /// Reinterpret a raw value received from the host.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value handed to the host.
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    fn encode(slot: u32, generation: u32) -> Self {
        Self(((slot as u64) << 32) | (generation as u64))
    }

    fn decode(self) -> (u32, u32) {
        ((self.0 >> 32) as u32, self.0 as u32)
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.decode();
        write!(f, "#{slot}.{generation}")
    }
}

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A slot+generation table mapping [`BufferHandle`]s to owned values.
///
/// Slots are reused through a free list; the generation counter advances
/// on every removal.
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    /// Create an empty table. `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Insert a value and return its handle.
    pub fn insert(&mut self, value: T) -> BufferHandle {
        self.live += 1;
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            BufferHandle::encode(slot_idx, slot.generation)
        } else {
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(value),
            });
            BufferHandle::encode(slot_idx, 0)
        }
    }

    /// Borrow the value behind a live handle.
    pub fn get(&self, handle: BufferHandle) -> Option<&T> {
        let (slot_idx, generation) = handle.decode();
        let slot = self.slots.get(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Mutably borrow the value behind a live handle.
    pub fn get_mut(&mut self, handle: BufferHandle) -> Option<&mut T> {
        let (slot_idx, generation) = handle.decode();
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Remove the value behind a handle.
    ///
    /// A slot whose generation wraps back to 0 is retired permanently
    /// rather than recycled, so a handle from the first epoch can never
    /// resolve again.
    pub fn remove(&mut self, handle: BufferHandle) -> Option<T> {
        let (slot_idx, generation) = handle.decode();
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        self.live -= 1;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(slot_idx);
        }
        Some(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no entry is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Handles of every live entry, in slot order.
    pub fn handles(&self) -> Vec<BufferHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.data.is_some())
            .map(|(i, s)| BufferHandle::encode(i as u32, s.generation))
            .collect()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_round_trip() {
        let mut table = HandleTable::new();
        let h = table.insert(42i32);
        assert_eq!(table.get(h), Some(&42));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn get_mut_modifies_value() {
        let mut table = HandleTable::new();
        let h = table.insert(10i32);
        *table.get_mut(h).unwrap() = 20;
        assert_eq!(table.get(h), Some(&20));
    }

    #[test]
    fn stale_handle_after_remove() {
        let mut table = HandleTable::new();
        let h = table.insert(1i32);
        assert_eq!(table.remove(h), Some(1));
        assert_eq!(table.get(h), None);
        assert_eq!(table.get_mut(h), None);
        assert_eq!(table.remove(h), None);
        assert!(table.is_empty());
    }

    #[test]
    fn free_list_reuses_slot_with_new_generation() {
        let mut table = HandleTable::new();
        let h1 = table.insert(1i32);
        table.remove(h1);
        let h2 = table.insert(2i32);
        let (slot1, gen1) = h1.decode();
        let (slot2, gen2) = h2.decode();
        assert_eq!(slot1, slot2);
        assert_eq!(gen2, gen1 + 1);
        assert_eq!(table.get(h2), Some(&2));
        assert_eq!(table.get(h1), None);
    }

    #[test]
    fn never_issued_handle_is_rejected() {
        let table: HandleTable<i32> = HandleTable::new();
        assert_eq!(table.get(BufferHandle::encode(999, 0)), None);
        assert_eq!(table.get(BufferHandle::from_raw(u64::MAX)), None);
    }

    #[test]
    fn handles_lists_live_entries_only() {
        let mut table = HandleTable::new();
        let a = table.insert('a');
        let b = table.insert('b');
        let c = table.insert('c');
        table.remove(b);
        assert_eq!(table.handles(), vec![a, c]);
    }

    #[test]
    fn generation_exhaustion_retires_slot() {
        let mut table = HandleTable::new();
        let h = table.insert(1i32);
        table.remove(h);

        table.slots[0].generation = u32::MAX;
        let h2 = table.insert(2i32);
        assert_eq!(h2.decode(), (0, u32::MAX));

        // Removal wraps the generation to 0: the slot must be retired.
        table.remove(h2);
        assert_eq!(table.slots[0].generation, 0);
        assert!(!table.free_list.contains(&0));
        assert_eq!(table.get(BufferHandle::encode(0, 0)), None);

        let h3 = table.insert(3i32);
        assert_ne!(h3.decode().0, 0);
    }

    #[test]
    fn raw_round_trip_and_display() {
        let h = BufferHandle::encode(3, 7);
        assert_eq!(BufferHandle::from_raw(h.into_raw()), h);
        assert_eq!(h.into_raw(), (3u64 << 32) | 7);
        assert_eq!(h.to_string(), "#3.7");
    }
}
