//! Target-process access: region catalog and remote reads.

pub mod maps;
pub mod reader;

pub use maps::{MemoryRegion, Permissions, list_regions};
pub use reader::{MemorySource, ProcessMemory, read_remote, read_window};
