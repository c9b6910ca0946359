//! memscout — live process-memory inspection core.
//!
//! Enumerates the mapped regions of a foreign process, bulk-reads its
//! memory through a single vectorized cross-process syscall, streams
//! gigabyte-scale regions through a boundary-safe chunked pattern scanner,
//! fans region scans out under a bounded-concurrency orchestrator, and
//! resolves reverse references by treating addresses as 8-byte
//! little-endian patterns.
//!
//! The target process is never written to; its memory may change between
//! the region snapshot and any later read, which surfaces only as
//! recoverable read failures.

pub mod error;
pub mod proc;
pub mod refs;
pub mod render;
pub mod scan;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{InspectError, Result};
pub use proc::{MemoryRegion, MemorySource, Permissions, ProcessMemory, list_regions, read_remote, read_window};
pub use refs::{POINTER_SIZE, REF_CONTEXT, Reference, find_references};
pub use scan::{
    HighlightPattern, ScanConfig, SearchMatch, SkippedRegion, parallel_pattern_search, scan_all,
    scan_region,
};
