//! Fixed-page first-fit allocation with splitting and coalescing.
//!
//! Provides a single fixed-capacity arena carved into blocks by a
//! first-fit policy. Blocks split on allocation and merge eagerly on
//! deallocation, so free space stays as coarse as the allocation
//! pattern allows. This crate contains no `unsafe` code.
//!
//! # Architecture
//!
//! ```text
//! Arena (lifecycle + allocation policy)
//! ├── Vec<u8> page (zero-filled backing storage, fixed capacity)
//! └── BlockTable (ordered block metadata)
//!     ├── Vec<Block> slab + free-list of retired slots
//!     └── IndexMap offset → slot (exact-offset lookup for dealloc)
//! ```
//!
//! Control flows strictly downward: `alloc`/`dealloc` drive the
//! `BlockTable`, which only ever describes byte ranges of the page and
//! never touches the storage itself. Metadata and payload are
//! physically separate.
//!
//! # Ownership model
//!
//! The arena is an explicit instance: no globals, any number of
//! independent arenas may coexist. Callers hold only opaque
//! [`Address`] tokens, never block metadata. `teardown` consumes the
//! arena, so use-after-teardown does not compile.
//!
//! # Quick start
//!
//! ```rust
//! use pagefit::{Arena, ArenaConfig};
//!
//! let mut arena = Arena::new(ArenaConfig::default()).unwrap();
//! let addr = arena.alloc(64).unwrap();
//! arena.bytes_mut(addr).unwrap().fill(0xAB);
//! arena.dealloc(addr);
//! assert_eq!(arena.free_bytes(), arena.page_size());
//! arena.teardown().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod handle;
mod table;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::{Address, BlockInfo};
