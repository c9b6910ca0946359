//! Pattern scanning: chunked region scanner and the parallel orchestrator.

pub mod chunk;
pub mod config;
pub mod orchestrator;


pub use chunk::scan_region;
pub use config::{
    DEFAULT_CONTEXT, DEFAULT_EXCLUDE_PATH, DEFAULT_MAX_TASKS, DEFAULT_WINDOW_SIZE,
    HighlightPattern, ScanConfig,
};
pub use orchestrator::{SkippedRegion, parallel_pattern_search, scan_all};

use crate::proc::MemoryRegion;

/// 一处模式匹配
///
/// `context` 是匹配周围字节的独立副本，`pattern_offset` 是匹配起点
/// 在 `context` 内的下标，恒有 `pattern_offset + pattern_length <= context.len()`。
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// 匹配起点的绝对虚拟地址
    pub address: u64,
    /// 所属区域（按值复制的描述符）
    pub region: MemoryRegion,
    pub context: Vec<u8>,
    pub pattern_offset: usize,
    pub pattern_length: usize,
}
