//! 并行编排器：把单区域扫描扇出到所有可读区域
//!
//! 每个区域一个任务，由固定线程数的 rayon 池限流（默认 16 路在飞），
//! 每个在飞任务最多持有一个窗口缓冲区，并发上限即聚合内存上限。
//!
//! 单区域失败只记入诊断列表，绝不中止兄弟任务 —— 活进程的地址空间
//! 本来就部分不可读、随时在变，尽力而为的广度优先于单区域的完整性。

use std::sync::Mutex;

use log::{Level, debug, log_enabled, warn};
use rayon::prelude::*;
use regex::Regex;

use crate::error::{InspectError, Result};
use crate::proc::{MemorySource, MemoryRegion};
use crate::scan::chunk::scan_region;
use crate::scan::config::ScanConfig;
use crate::scan::SearchMatch;

/// 被跳过区域的诊断记录
///
/// 编排器吞掉区域级错误，但保留出错原因供调用方观察；忽略即得到
/// 原始的"静默丢弃"行为。
#[derive(Debug)]
pub struct SkippedRegion {
    pub region: MemoryRegion,
    pub error: InspectError,
}

/// 编译路径排除模式
///
/// 模式非法时记日志并放弃排除，不让配置问题中断整次检查。
fn compile_exclude(pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern?;
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("invalid exclude pattern {pattern:?}: {e}");
            None
        },
    }
}

/// 对每个可读且未被排除的区域并发执行 `per_region`
///
/// 阻塞到所有任务完成。区域级错误被捕获进返回的诊断列表，
/// 不向上传播、不影响其他区域。
pub fn scan_all<F>(
    regions: &[MemoryRegion],
    config: &ScanConfig,
    per_region: F,
) -> Result<Vec<SkippedRegion>>
where
    F: Fn(&MemoryRegion) -> Result<()> + Sync,
{
    if config.max_tasks == 0 {
        return Err(InspectError::InvalidArgument("max_tasks must be at least 1".into()));
    }

    let exclude = compile_exclude(config.exclude_path.as_deref());
    let eligible: Vec<&MemoryRegion> = regions
        .iter()
        .filter(|r| r.is_readable())
        .filter(|r| !exclude.as_ref().is_some_and(|re| re.is_match(&r.path)))
        .collect();

    if eligible.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_tasks.min(eligible.len()))
        .build()
        .map_err(|e| InspectError::InvalidArgument(format!("failed to build scan pool: {e}")))?;

    let skipped: Vec<SkippedRegion> = pool.install(|| {
        eligible
            .par_iter()
            .filter_map(|region| {
                per_region(region).err().map(|error| {
                    if log_enabled!(Level::Debug) {
                        warn!("skipping region 0x{:x}-0x{:x}: {error}", region.start, region.end);
                    }
                    SkippedRegion { region: (*region).clone(), error }
                })
            })
            .collect()
    });

    Ok(skipped)
}

/// 在所有可读区域内并行搜索一个模式，聚合全部匹配
///
/// 单区域内的匹配先在任务本地按地址升序累积，再整段追加进共享
/// 序列，因此区域内有序；跨区域的顺序由任务完成顺序决定，未定义。
pub fn parallel_pattern_search<S>(
    source: &S,
    regions: &[MemoryRegion],
    config: &ScanConfig,
) -> Result<Vec<SearchMatch>>
where
    S: MemorySource + ?Sized,
{
    let matches = Mutex::new(Vec::new());

    let skipped = scan_all(regions, config, |region| {
        let mut local = Vec::new();
        scan_region(
            source,
            region,
            &config.pattern,
            config.context_before,
            config.context_after,
            config.window_size,
            |address, context, pattern_offset| {
                local.push(SearchMatch {
                    address,
                    region: region.clone(),
                    context,
                    pattern_offset,
                    pattern_length: config.pattern.len(),
                });
            },
        )?;

        if !local.is_empty() {
            let mut guard = matches.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.extend(local);
        }
        Ok(())
    })?;

    if !skipped.is_empty() {
        debug!("{} regions skipped during pattern search", skipped.len());
    }

    Ok(matches.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
}
