//! Page addresses and decoded trace accesses.
//!
//! A [`Page`] is the unit of residency: a raw virtual address masked down to
//! its page boundary. Content is never modeled, only identity.
//!
//! ## Example
//!
//! ```
//! use pagesim::page::{Access, Direction, Page, PAGE_SIZE};
//!
//! let page = Page::containing(0x7fff_ffff_d9a8);
//! assert_eq!(page.addr(), 0x7fff_ffff_d000);
//! assert_eq!(page.addr() % PAGE_SIZE, 0);
//!
//! let access = Access::store(0x7fff_ffff_d980);
//! assert_eq!(access.direction, Direction::Store);
//! assert_eq!(access.page, page);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulated page size in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// A page-aligned address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(u64);

impl Page {
    /// Returns the [`PAGE_SIZE`] page containing `addr`.
    #[inline]
    pub const fn containing(addr: u64) -> Self {
        Self(addr & !(PAGE_SIZE - 1))
    }

    /// Returns the page of `page_size` bytes containing `addr`.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[inline]
    pub fn containing_with(addr: u64, page_size: u64) -> Self {
        assert!(
            page_size.is_power_of_two(),
            "page size {page_size} is not a power of two"
        );
        Self(addr & !(page_size - 1))
    }

    /// Wraps an already-aligned page address as-is.
    ///
    /// Useful for synthetic traces where page numbers stand in for addresses.
    #[inline]
    pub const fn from_raw(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the page start address.
    #[inline]
    pub const fn addr(self) -> u64 {
        self.0
    }
}

impl From<u64> for Page {
    fn from(addr: u64) -> Self {
        Self::from_raw(addr)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Whether an access read or wrote memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Load,
    Store,
}

impl Direction {
    #[inline]
    pub fn is_load(self) -> bool {
        matches!(self, Direction::Load)
    }
}

/// One decoded trace record, in original trace order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Access {
    pub direction: Direction,
    pub page: Page,
}

impl Access {
    /// A load from the page containing `addr`.
    pub const fn load(addr: u64) -> Self {
        Self {
            direction: Direction::Load,
            page: Page::containing(addr),
        }
    }

    /// A store to the page containing `addr`.
    pub const fn store(addr: u64) -> Self {
        Self {
            direction: Direction::Store,
            page: Page::containing(addr),
        }
    }
}
