//! The arena: page lifecycle and the first-fit allocation policy.
//!
//! [`Arena`] owns the zero-filled backing page and the
//! [`BlockTable`](crate::table) describing it. It is an explicit
//! instance — no globals, any number of independent arenas may coexist
//! — and `teardown` consumes the value, so nothing can call into a
//! torn-down arena.

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{Address, BlockInfo};
use crate::table::BlockTable;

/// A fixed-capacity arena allocated out of one contiguous page.
///
/// Allocation is first-fit over blocks in ascending offset order, with
/// splitting on allocation and eager coalescing on deallocation. All
/// mutating operations take `&mut self`; concurrent unsynchronized use
/// is a compile error rather than a documented violation.
#[derive(Debug)]
pub struct Arena {
    /// Backing storage. Zero-filled at construction, never resized.
    page: Vec<u8>,
    /// Ordered metadata describing how `page` is carved up.
    table: BlockTable,
    /// Allocation granularity, copied out of the config.
    min_alloc: usize,
    /// Count of `dealloc` calls that resolved to no live allocation.
    rejected_deallocs: u64,
}

impl Arena {
    /// Create an arena from the given configuration.
    ///
    /// Reserves and zero-fills the backing page and builds the block
    /// table with a single free block covering it. Nothing is leaked on
    /// the failure path: the page is only committed once the
    /// reservation has succeeded, and a partially built arena is
    /// dropped whole.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidConfig`] if the config fails validation,
    /// [`ArenaError::AllocationFailed`] if the page reservation fails.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config
            .validate()
            .map_err(|reason| ArenaError::InvalidConfig { reason })?;
        let mut page = Vec::new();
        page.try_reserve_exact(config.page_size)
            .map_err(|_| ArenaError::AllocationFailed {
                requested: config.page_size,
            })?;
        page.resize(config.page_size, 0);
        Ok(Self {
            page,
            table: BlockTable::new(config.page_size, config.min_alloc),
            min_alloc: config.min_alloc,
            rejected_deallocs: 0,
        })
    }

    /// Release the block table and the backing page.
    ///
    /// Consumes the arena; every outstanding [`Address`] becomes
    /// unusable at compile time. The [`ArenaError::ReleaseFailed`]
    /// variant is the contract slot for backings whose release call can
    /// fail — the process-heap backing releases infallibly, so this
    /// build always returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// [`ArenaError::ReleaseFailed`] if the backing release fails.
    pub fn teardown(self) -> Result<(), ArenaError> {
        let Self { page, table, .. } = self;
        drop(table);
        drop(page);
        Ok(())
    }

    /// Allocate `size` bytes from the first free block that fits.
    ///
    /// The chosen block is split when the remainder is at least the
    /// granularity; smaller remainders are handed out with the block.
    /// Returned regions are not re-zeroed on reuse — contents are
    /// whatever the previous holder left there.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidSize`] if `size` is zero or not a multiple
    /// of the granularity (rejected before any mutation);
    /// [`ArenaError::OutOfMemory`] if no free block is large enough —
    /// the arena attempts no compaction beyond the coalescing already
    /// done at `dealloc` time.
    pub fn alloc(&mut self, size: usize) -> Result<Address, ArenaError> {
        if size == 0 || size % self.min_alloc != 0 {
            return Err(ArenaError::InvalidSize {
                requested: size,
                granularity: self.min_alloc,
            });
        }
        let Some(slot) = self.table.find_first_fit(size) else {
            return Err(ArenaError::OutOfMemory {
                requested: size,
                largest_free: self.table.largest_free(),
            });
        };
        self.table.split(slot, size);
        self.table.mark_allocated(slot);
        debug_assert!(self.table.is_consistent(self.page.len()));
        Ok(Address {
            offset: self.table.offset_of(slot),
        })
    }

    /// Return an allocation to the arena and coalesce.
    ///
    /// A token that resolves to no currently-allocated block — foreign,
    /// stale, or already freed — is a silent no-op; the arena state is
    /// untouched and the rejection is counted in
    /// [`rejected_deallocs`](Self::rejected_deallocs). Callers must not
    /// rely on the no-op for error detection.
    pub fn dealloc(&mut self, addr: Address) {
        let Some(slot) = self.table.locate_by_offset(addr.offset) else {
            self.rejected_deallocs += 1;
            return;
        };
        if !self.table.mark_free(slot) {
            self.rejected_deallocs += 1;
            return;
        }
        self.table.coalesce();
        debug_assert!(self.table.is_consistent(self.page.len()));
    }

    /// The payload bytes of a live allocation, or `None` for a token
    /// that does not name one.
    pub fn bytes(&self, addr: Address) -> Option<&[u8]> {
        let slot = self.table.locate_by_offset(addr.offset)?;
        if self.table.is_free(slot) {
            return None;
        }
        let size = self.table.size_of(slot);
        Some(&self.page[addr.offset..addr.offset + size])
    }

    /// Mutable payload bytes of a live allocation, or `None` for a
    /// token that does not name one.
    pub fn bytes_mut(&mut self, addr: Address) -> Option<&mut [u8]> {
        let slot = self.table.locate_by_offset(addr.offset)?;
        if self.table.is_free(slot) {
            return None;
        }
        let size = self.table.size_of(slot);
        Some(&mut self.page[addr.offset..addr.offset + size])
    }

    /// Total arena capacity in bytes.
    pub fn page_size(&self) -> usize {
        self.page.len()
    }

    /// Allocation granularity in bytes.
    pub fn min_alloc(&self) -> usize {
        self.min_alloc
    }

    /// Total bytes currently free across all free blocks.
    pub fn free_bytes(&self) -> usize {
        self.table.free_bytes()
    }

    /// Total bytes currently allocated.
    pub fn used_bytes(&self) -> usize {
        self.page.len() - self.table.free_bytes()
    }

    /// Size of the largest free block; the biggest request that can
    /// currently succeed.
    pub fn largest_free(&self) -> usize {
        self.table.largest_free()
    }

    /// Number of blocks in the index, free and allocated.
    pub fn block_count(&self) -> usize {
        self.table.block_count()
    }

    /// The arena layout in ascending offset order.
    ///
    /// Consecutive records are contiguous and together cover the whole
    /// page.
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.table.blocks()
    }

    /// How many `dealloc` calls were rejected as foreign, stale, or
    /// double frees. Diagnostic only; the calls themselves are no-ops.
    pub fn rejected_deallocs(&self) -> u64 {
        self.rejected_deallocs
    }
}
