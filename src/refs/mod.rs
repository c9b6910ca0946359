//! 引用解析器：把地址当作模式做反向查找
//!
//! 目标地址编码成 8 字节小端模式，复用分块扫描器 + 并行编排器在
//! 整个地址空间里找出内容等于该地址的内存位置，产出反向引用索引。
//!
//! 每个目标地址做一趟完整的地址空间扫描 —— 小目标集够用；
//! 大目标集需要多模式匹配（如 Aho-Corasick）批处理，这里不做。

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::error::Result;
use crate::proc::{MemorySource, MemoryRegion};
use crate::scan::chunk::scan_region;
use crate::scan::config::ScanConfig;
use crate::scan::orchestrator::scan_all;

/// x86_64 指针宽度
pub const POINTER_SIZE: usize = 8;

/// 引用匹配前后各保留的上下文字节数
pub const REF_CONTEXT: usize = 64;

/// 一个候选指针：内容解码后等于某个已知地址的 8 字节值
///
/// 不变量：`context[ref_offset..ref_offset + 8]` 按小端解码恒等于
/// `target_address`。
#[derive(Debug, Clone)]
pub struct Reference {
    /// 找到该 8 字节值的地址
    pub ref_address: u64,
    /// 它指向的地址
    pub target_address: u64,
    pub region: MemoryRegion,
    pub context: Vec<u8>,
    /// 8 字节值在 `context` 内的下标
    pub ref_offset: usize,
}

/// 在所有区域内查找指向每个目标地址的引用
///
/// 每个目标地址在结果里先占一个空条目，调用方能区分
/// "搜过但没找到" 和 "没搜过"。窗口容量、并发上限和路径排除
/// 取自 `config`；上下文固定为对称的 [`REF_CONTEXT`] 字节。
pub fn find_references<S>(
    source: &S,
    regions: &[MemoryRegion],
    targets: &[u64],
    config: &ScanConfig,
) -> Result<HashMap<u64, Vec<Reference>>>
where
    S: MemorySource + ?Sized,
{
    let mut result: HashMap<u64, Vec<Reference>> =
        targets.iter().map(|&addr| (addr, Vec::new())).collect();

    for &target in targets {
        let pattern = target.to_le_bytes();
        let found = Mutex::new(Vec::new());

        let skipped = scan_all(regions, config, |region| {
            let mut local = Vec::new();
            scan_region(
                source,
                region,
                &pattern,
                REF_CONTEXT,
                REF_CONTEXT,
                config.window_size,
                |ref_address, context, ref_offset| {
                    local.push(Reference {
                        ref_address,
                        target_address: target,
                        region: region.clone(),
                        context,
                        ref_offset,
                    });
                },
            )?;

            if !local.is_empty() {
                let mut guard = found.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                guard.extend(local);
            }
            Ok(())
        })?;

        let found = found.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(
            "target 0x{target:x}: {} references, {} regions skipped",
            found.len(),
            skipped.len()
        );

        // 条目在上面预置过，这里一定存在
        if let Some(entry) = result.get_mut(&target) {
            entry.extend(found);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::config::ScanConfig;
    use crate::testutil::MockMemory;

    #[test]
    fn roundtrips_little_endian_pointer() {
        // 在 0x5000 起的区域内，偏移 0x120 处放一个指向 0x5028 的指针
        let target: u64 = 0x5028;
        let mut mem = MockMemory::new();
        let mut data = vec![0u8; 0x1000];
        data[0x120..0x128].copy_from_slice(&target.to_le_bytes());
        let region = mem.add_region(0x5000, data);

        let mut config = ScanConfig::new(Vec::new());
        config.exclude_path = None;
        let refs = find_references(&mem, &[region.clone()], &[target], &config).unwrap();

        let entry = &refs[&target];
        assert_eq!(entry.len(), 1);
        let r = &entry[0];
        assert_eq!(r.ref_address, 0x5120);
        assert_eq!(r.target_address, target);
        assert_eq!(
            u64::from_le_bytes(r.context[r.ref_offset..r.ref_offset + 8].try_into().unwrap()),
            target
        );
        // 对称 64 字节上下文，区域中部不截断
        assert_eq!(r.ref_offset, REF_CONTEXT);
        assert_eq!(r.context.len(), REF_CONTEXT + POINTER_SIZE + REF_CONTEXT);
    }

    #[test]
    fn unfound_target_keeps_empty_entry() {
        let mut mem = MockMemory::new();
        let region = mem.add_region(0x5000, vec![0u8; 0x200]);

        let mut config = ScanConfig::new(Vec::new());
        config.exclude_path = None;
        let refs = find_references(&mem, &[region], &[0xdead_beef_u64], &config).unwrap();

        assert_eq!(refs.len(), 1);
        assert!(refs[&0xdead_beef_u64].is_empty());
    }

    #[test]
    fn collects_references_across_regions() {
        let target: u64 = 0x9000;
        let mut mem = MockMemory::new();

        let mut a = vec![0u8; 0x100];
        a[0x10..0x18].copy_from_slice(&target.to_le_bytes());
        let ra = mem.add_region(0x10000, a);

        let mut b = vec![0u8; 0x100];
        b[0x40..0x48].copy_from_slice(&target.to_le_bytes());
        let rb = mem.add_region(0x20000, b);

        let mut config = ScanConfig::new(Vec::new());
        config.exclude_path = None;
        let refs = find_references(&mem, &[ra, rb], &[target], &config).unwrap();

        let mut addrs: Vec<u64> = refs[&target].iter().map(|r| r.ref_address).collect();
        addrs.sort_unstable();
        assert_eq!(addrs, vec![0x10010, 0x20040]);
    }
}
