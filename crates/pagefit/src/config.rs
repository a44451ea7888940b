//! Arena configuration parameters.

/// Configuration for a fixed-page arena.
///
/// Controls the page capacity and the allocation granularity. Validated
/// by [`Arena::new`](crate::Arena::new); all values are immutable after
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total arena capacity in bytes.
    ///
    /// Default: 4096 (one page). Must be positive and a multiple of
    /// `min_alloc`.
    pub page_size: usize,

    /// Allocation granularity in bytes.
    ///
    /// Every allocation size must be an exact multiple of this value,
    /// and it is also the smallest fragment a split will leave behind.
    /// Default: 16. Must be positive.
    pub min_alloc: usize,
}

impl ArenaConfig {
    /// Default page capacity: one 4KB page.
    pub const DEFAULT_PAGE_SIZE: usize = 4096;

    /// Default allocation granularity.
    pub const DEFAULT_MIN_ALLOC: usize = 16;

    /// Create a config with the given page size and granularity.
    pub fn new(page_size: usize, min_alloc: usize) -> Self {
        Self {
            page_size,
            min_alloc,
        }
    }

    /// Check the config for internal consistency.
    ///
    /// Returns the reason on failure; [`Arena::new`](crate::Arena::new)
    /// wraps it in [`ArenaError::InvalidConfig`](crate::ArenaError).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.min_alloc == 0 {
            return Err("min_alloc must be positive");
        }
        if self.page_size == 0 {
            return Err("page_size must be positive");
        }
        if self.page_size % self.min_alloc != 0 {
            return Err("page_size must be a multiple of min_alloc");
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE, Self::DEFAULT_MIN_ALLOC)
    }
}
