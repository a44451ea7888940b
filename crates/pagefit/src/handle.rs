//! Opaque allocation addresses and block extent records.
//!
//! An [`Address`] is the token [`Arena::alloc`](crate::Arena::alloc)
//! hands back. It wraps the block's byte offset but keeps it crate-
//! private: callers cannot fabricate one, and
//! [`Arena::dealloc`](crate::Arena::dealloc) resolves it against the
//! live block table, so a stale or foreign token degrades to a counted
//! no-op instead of corrupting metadata.

use std::fmt;

/// Opaque token identifying one live allocation within an arena.
///
/// Obtained from `alloc`, redeemed by `dealloc` and the byte-access
/// methods. Tokens are `Copy`; holding one past its deallocation is
/// harmless (every use re-validates against the block table).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Address {
    /// Byte offset of the block from the start of the page.
    pub(crate) offset: usize,
}

impl Address {
    /// Byte offset of the allocation from the start of the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(offset={})", self.offset)
    }
}

/// Read-only description of one block in the arena's layout.
///
/// Yielded by [`Arena::blocks`](crate::Arena::blocks) in ascending
/// offset order. Consecutive records are always contiguous
/// (`offset + size` of one equals `offset` of the next) and together
/// they cover the whole page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Byte offset of the block from the start of the page.
    pub offset: usize,
    /// Extent of the block in bytes.
    pub size: usize,
    /// Whether the block is currently free.
    pub free: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_exposes_offset() {
        let addr = Address { offset: 128 };
        assert_eq!(addr.offset(), 128);
    }

    #[test]
    fn address_display_names_offset() {
        let addr = Address { offset: 64 };
        assert_eq!(addr.to_string(), "Address(offset=64)");
    }

    #[test]
    fn addresses_compare_by_offset() {
        assert_eq!(Address { offset: 16 }, Address { offset: 16 });
        assert_ne!(Address { offset: 16 }, Address { offset: 32 });
    }
}
