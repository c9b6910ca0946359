//! 分块扫描器：在单个区域内流式搜索字节模式
//!
//! 区域可能有几个 GiB，绝不整体物化。按固定容量的窗口流式读取，
//! 相邻窗口之间回读 `len(pattern) - 1` 字节的重叠区，
//! 保证跨窗口边界的匹配不会丢失。
//!
//! 窗口内用 memchr 的 memmem 做精确子串搜索，每找到一处就前进一个字节
//! 继续搜，因此相邻/互相重叠的出现全部上报，不会合并。

use memchr::memmem;

use crate::error::{InspectError, Result};
use crate::proc::{MemorySource, MemoryRegion, read_remote};

/// 在一个区域内搜索 `pattern` 的所有出现
///
/// 对每处匹配调用 `on_match(绝对地址, 上下文副本, 模式在上下文内的偏移)`。
/// 上下文是独立拷贝，与扫描内部缓冲区解耦，扫描结束后仍可安全持有。
///
/// 窗口读取失败（`ReadFailed` / `EmptyRead`）终止本区域的扫描并向上传播；
/// 是否影响其他区域由编排器决定。短读只截断当前窗口，按实际读到的
/// 字节数搜索并推进。
pub fn scan_region<S, F>(
    source: &S,
    region: &MemoryRegion,
    pattern: &[u8],
    context_before: usize,
    context_after: usize,
    window_size: usize,
    mut on_match: F,
) -> Result<()>
where
    S: MemorySource + ?Sized,
    F: FnMut(u64, Vec<u8>, usize),
{
    if pattern.is_empty() {
        return Err(InspectError::InvalidArgument("empty search pattern".into()));
    }
    if window_size < pattern.len() {
        return Err(InspectError::InvalidArgument(format!(
            "window size {window_size} smaller than pattern length {}",
            pattern.len()
        )));
    }

    let region_size = region.size();
    let overlap = pattern.len() - 1;
    let finder = memmem::Finder::new(pattern);

    let mut chunk_start: u64 = 0;
    while chunk_start < region_size {
        let want = (region_size - chunk_start).min(window_size as u64) as usize;
        let data = read_remote(source, region.start + chunk_start, want)?;
        let window_len = data.len();

        // 逐个上报本窗口内的所有出现，左到右
        let mut from = 0;
        while let Some(rel) = finder.find(&data[from..]) {
            let i = from + rel;

            let span_start = i.saturating_sub(context_before);
            let span_end = window_len.min(i + pattern.len() + context_after);
            let context = data[span_start..span_end].to_vec();

            on_match(region.start + chunk_start + i as u64, context, i - span_start);

            from = i + 1;
        }

        // 推进到下一窗口，留出重叠区；重叠区装不下一个完整模式时无法再推进
        if chunk_start + window_len as u64 >= region_size || window_len <= overlap {
            break;
        }
        chunk_start += (window_len - overlap) as u64;
    }

    Ok(())
}
