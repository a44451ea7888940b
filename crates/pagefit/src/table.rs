//! Ordered block metadata for the arena page.
//!
//! [`BlockTable`] tracks how the page is carved up: a slab of `Block`
//! records in offset order, linked by slot indices rather than
//! pointers. Slots retired by coalescing go on a free-list and are
//! reused by later splits, so the slab never shrinks but also never
//! dangles. An offset map gives exact-offset lookup when a caller's
//! address token has to be mapped back to its metadata.

use indexmap::IndexMap;

use crate::handle::BlockInfo;

/// One block metadata record.
#[derive(Clone, Copy, Debug)]
struct Block {
    /// Byte offset from the start of the page.
    offset: usize,
    /// Extent in bytes. Always a positive multiple of the granularity.
    size: usize,
    /// Whether the extent is currently unallocated.
    free: bool,
    /// Slot index of the successor in offset order.
    next: Option<usize>,
    /// Whether this slot currently holds a list member (not retired).
    live: bool,
}

/// The ordered block index for one arena page.
///
/// Maintains, across every mutation: strictly increasing offsets along
/// the `next` chain, contiguity (`a.offset + a.size == b.offset` for
/// consecutive blocks), exact coverage of `[0, page_size)`, and — once
/// a mutating operation completes — no two list-adjacent free blocks.
#[derive(Debug)]
pub(crate) struct BlockTable {
    /// All block records (list members and retired slots).
    slots: Vec<Block>,
    /// Indices of retired slots available for reuse.
    free_slots: Vec<usize>,
    /// Slot index of the block at offset 0. Never retired.
    head: usize,
    /// Exact-offset lookup: block offset → slot index.
    offset_map: IndexMap<usize, usize>,
    /// Allocation granularity; the minimum viable split remainder.
    min_alloc: usize,
}

impl BlockTable {
    /// Create a table with a single free block covering the whole page.
    pub(crate) fn new(page_size: usize, min_alloc: usize) -> Self {
        let initial = Block {
            offset: 0,
            size: page_size,
            free: true,
            next: None,
            live: true,
        };
        let mut offset_map = IndexMap::new();
        offset_map.insert(0, 0);
        Self {
            slots: vec![initial],
            free_slots: Vec::new(),
            head: 0,
            offset_map,
            min_alloc,
        }
    }

    /// First block in offset order that is free and at least `size`
    /// bytes, or `None`. Linear scan — the page is small and the block
    /// count bounded by `page_size / min_alloc`.
    pub(crate) fn find_first_fit(&self, size: usize) -> Option<usize> {
        let mut cursor = Some(self.head);
        while let Some(slot) = cursor {
            let block = &self.slots[slot];
            if block.free && block.size >= size {
                return Some(slot);
            }
            cursor = block.next;
        }
        None
    }

    /// Block whose offset exactly matches `offset`, or `None`.
    ///
    /// The returned slot may describe a free block; the caller decides
    /// whether that counts as a double-free.
    pub(crate) fn locate_by_offset(&self, offset: usize) -> Option<usize> {
        self.offset_map.get(&offset).copied()
    }

    /// Carve `slot` down to `size` bytes, inserting the free remainder
    /// immediately after it in the list.
    ///
    /// No-op when the remainder would be smaller than the granularity:
    /// the whole block is handed out instead of leaving an unusable
    /// fragment.
    pub(crate) fn split(&mut self, slot: usize, size: usize) {
        let block = self.slots[slot];
        debug_assert!(block.live && block.free && size <= block.size);
        if block.size - size < self.min_alloc {
            return;
        }
        let remainder = Block {
            offset: block.offset + size,
            size: block.size - size,
            free: true,
            next: block.next,
            live: true,
        };
        let new_slot = self.take_slot(remainder);
        let block = &mut self.slots[slot];
        block.size = size;
        block.next = Some(new_slot);
        self.offset_map.insert(remainder.offset, new_slot);
    }

    /// Mark a block as allocated.
    pub(crate) fn mark_allocated(&mut self, slot: usize) {
        self.slots[slot].free = false;
    }

    /// Mark a block as free. Returns `false` if it already was
    /// (a double-free from the caller's side).
    pub(crate) fn mark_free(&mut self, slot: usize) -> bool {
        if self.slots[slot].free {
            return false;
        }
        self.slots[slot].free = true;
        true
    }

    /// Merge every run of list-adjacent, physically contiguous free
    /// blocks into its leftmost member, retiring the absorbed slots.
    ///
    /// Single pass: after a merge the comparison repeats at the same
    /// position, so a chain of three or more free blocks collapses in
    /// one sweep.
    pub(crate) fn coalesce(&mut self) {
        let mut current = self.head;
        while let Some(next) = self.slots[current].next {
            let left = self.slots[current];
            let right = self.slots[next];
            if left.free && right.free && left.offset + left.size == right.offset {
                self.slots[current].size += right.size;
                self.slots[current].next = right.next;
                self.offset_map.swap_remove(&right.offset);
                self.retire_slot(next);
            } else {
                current = next;
            }
        }
    }

    /// Byte offset of the block in `slot`.
    pub(crate) fn offset_of(&self, slot: usize) -> usize {
        self.slots[slot].offset
    }

    /// Extent of the block in `slot`.
    pub(crate) fn size_of(&self, slot: usize) -> usize {
        self.slots[slot].size
    }

    /// Whether the block in `slot` is free.
    pub(crate) fn is_free(&self, slot: usize) -> bool {
        self.slots[slot].free
    }

    /// Total bytes currently free.
    pub(crate) fn free_bytes(&self) -> usize {
        self.blocks().filter(|b| b.free).map(|b| b.size).sum()
    }

    /// Size of the largest free block, or 0 when nothing is free.
    pub(crate) fn largest_free(&self) -> usize {
        self.blocks()
            .filter(|b| b.free)
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    /// Number of blocks in the list (free and allocated).
    pub(crate) fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// The blocks in ascending offset order.
    pub(crate) fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        let mut cursor = Some(self.head);
        std::iter::from_fn(move || {
            let slot = cursor?;
            let block = &self.slots[slot];
            cursor = block.next;
            Some(BlockInfo {
                offset: block.offset,
                size: block.size,
                free: block.free,
            })
        })
    }

    /// Structural invariant check, `debug_assert`ed by the arena after
    /// every mutating operation and asserted directly by tests.
    pub(crate) fn is_consistent(&self, page_size: usize) -> bool {
        let mut expected_offset = 0;
        let mut previous_free = false;
        let mut count = 0;
        let mut cursor = Some(self.head);
        while let Some(slot) = cursor {
            let block = &self.slots[slot];
            if !block.live
                || block.offset != expected_offset
                || block.size == 0
                || block.size % self.min_alloc != 0
                || (previous_free && block.free)
                || self.offset_map.get(&block.offset) != Some(&slot)
            {
                return false;
            }
            expected_offset += block.size;
            previous_free = block.free;
            count += 1;
            cursor = block.next;
        }
        expected_offset == page_size && self.offset_map.len() == count
    }

    fn take_slot(&mut self, block: Block) -> usize {
        if let Some(slot) = self.free_slots.pop() {
            self.slots[slot] = block;
            slot
        } else {
            self.slots.push(block);
            self.slots.len() - 1
        }
    }

    fn retire_slot(&mut self, slot: usize) {
        self.slots[slot].live = false;
        self.slots[slot].next = None;
        self.free_slots.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: usize = 256;
    const GRAIN: usize = 16;

    fn layout(table: &BlockTable) -> Vec<(usize, usize, bool)> {
        table.blocks().map(|b| (b.offset, b.size, b.free)).collect()
    }

    #[test]
    fn new_table_is_one_free_block() {
        let table = BlockTable::new(PAGE, GRAIN);
        assert_eq!(layout(&table), vec![(0, PAGE, true)]);
        assert!(table.is_consistent(PAGE));
    }

    #[test]
    fn first_fit_skips_allocated_and_small_blocks() {
        let mut table = BlockTable::new(PAGE, GRAIN);
        let a = table.find_first_fit(16).unwrap();
        table.split(a, 16);
        table.mark_allocated(a);
        let b = table.find_first_fit(32).unwrap();
        table.split(b, 32);
        table.mark_allocated(b);
        assert!(table.mark_free(a));
        // The 16-byte hole at offset 0 is too small for 32 bytes;
        // first fit must land on the tail block.
        let c = table.find_first_fit(32).unwrap();
        assert_eq!(table.offset_of(c), 48);
    }

    #[test]
    fn split_leaves_contiguous_remainder() {
        let mut table = BlockTable::new(PAGE, GRAIN);
        let slot = table.find_first_fit(64).unwrap();
        table.split(slot, 64);
        table.mark_allocated(slot);
        assert_eq!(layout(&table), vec![(0, 64, false), (64, PAGE - 64, true)]);
        assert!(table.is_consistent(PAGE));
    }

    #[test]
    fn split_skipped_when_remainder_below_granularity() {
        let mut table = BlockTable::new(64, GRAIN);
        let slot = table.find_first_fit(64).unwrap();
        table.split(slot, 64);
        table.mark_allocated(slot);
        assert_eq!(layout(&table), vec![(0, 64, false)]);
        assert!(table.is_consistent(64));
    }

    #[test]
    fn coalesce_collapses_free_chain_in_one_pass() {
        let mut table = BlockTable::new(PAGE, GRAIN);
        let mut slots = Vec::new();
        for size in [16, 32, 16] {
            let slot = table.find_first_fit(size).unwrap();
            table.split(slot, size);
            table.mark_allocated(slot);
            slots.push(slot);
        }
        for &slot in &slots {
            assert!(table.mark_free(slot));
        }
        table.coalesce();
        assert_eq!(layout(&table), vec![(0, PAGE, true)]);
        assert!(table.is_consistent(PAGE));
    }

    #[test]
    fn coalesce_leaves_allocated_separators_alone() {
        let mut table = BlockTable::new(PAGE, GRAIN);
        let a = table.find_first_fit(16).unwrap();
        table.split(a, 16);
        table.mark_allocated(a);
        let b = table.find_first_fit(32).unwrap();
        table.split(b, 32);
        table.mark_allocated(b);
        assert!(table.mark_free(a));
        table.coalesce();
        assert_eq!(
            layout(&table),
            vec![(0, 16, true), (16, 32, false), (48, PAGE - 48, true)]
        );
        assert!(table.is_consistent(PAGE));
    }

    #[test]
    fn locate_by_offset_finds_exact_matches_only() {
        let mut table = BlockTable::new(PAGE, GRAIN);
        let slot = table.find_first_fit(32).unwrap();
        table.split(slot, 32);
        table.mark_allocated(slot);
        assert_eq!(table.locate_by_offset(0), Some(slot));
        assert!(table.locate_by_offset(16).is_none());
        assert!(table.locate_by_offset(PAGE).is_none());
    }

    #[test]
    fn retired_slots_are_reused_by_later_splits() {
        let mut table = BlockTable::new(PAGE, GRAIN);
        let slot = table.find_first_fit(16).unwrap();
        table.split(slot, 16);
        table.mark_allocated(slot);
        let slab_len = table.slots.len();
        assert!(table.mark_free(slot));
        table.coalesce();
        // The merge retired one slot; a fresh split must reuse it
        // rather than grow the slab.
        let slot = table.find_first_fit(16).unwrap();
        table.split(slot, 16);
        table.mark_allocated(slot);
        assert_eq!(table.slots.len(), slab_len);
        assert!(table.is_consistent(PAGE));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn coverage_survives_arbitrary_splits(
                sizes in proptest::collection::vec(1usize..8, 1..16),
            ) {
                let mut table = BlockTable::new(PAGE, GRAIN);
                for chunks in sizes {
                    let size = chunks * GRAIN;
                    if let Some(slot) = table.find_first_fit(size) {
                        table.split(slot, size);
                        table.mark_allocated(slot);
                    }
                    prop_assert!(table.is_consistent(PAGE));
                }
            }

            #[test]
            fn freeing_everything_coalesces_to_one_block(
                sizes in proptest::collection::vec(1usize..8, 1..16),
            ) {
                let mut table = BlockTable::new(PAGE, GRAIN);
                let mut allocated = Vec::new();
                for chunks in sizes {
                    let size = chunks * GRAIN;
                    if let Some(slot) = table.find_first_fit(size) {
                        table.split(slot, size);
                        table.mark_allocated(slot);
                        allocated.push(slot);
                    }
                }
                for slot in allocated {
                    prop_assert!(table.mark_free(slot));
                    table.coalesce();
                    prop_assert!(table.is_consistent(PAGE));
                }
                prop_assert_eq!(table.block_count(), 1);
                prop_assert_eq!(table.free_bytes(), PAGE);
            }
        }
    }
}
