//! 区域目录：解析 /proc/<pid>/maps
//!
//! 内核保证 maps 条目按起始地址升序排列，解析时保持原始顺序。
//! 区域描述符是小的不可变值，整个检查过程中只复制、不修改。

use std::fmt;
use std::fs;
use std::io::ErrorKind;

use log::warn;

use crate::error::{InspectError, Result};

/// 区域权限标志，来自 maps 的 `rwxp`/`rwxs` 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    pub shared: bool,
}

impl Permissions {
    fn parse(field: &str) -> Option<Self> {
        let bytes = field.as_bytes();
        if bytes.len() < 4 {
            return None;
        }
        Some(Self {
            read: bytes[0] == b'r',
            write: bytes[1] == b'w',
            execute: bytes[2] == b'x',
            shared: bytes[3] == b's',
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.shared { 's' } else { 'p' },
        )
    }
}

/// 一段权限一致的连续虚拟地址区域
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub perms: Permissions,
    /// 映射文件路径，匿名映射为空串
    pub path: String,
}

impl MemoryRegion {
    #[inline]
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.perms.read
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:016x}-0x{:016x} ({:8} bytes) {} {}",
            self.start,
            self.end,
            self.size(),
            self.perms,
            self.path,
        )
    }
}

/// 解析单行 maps 条目
///
/// 格式: `start-end perms offset dev inode [pathname]`
fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let mut fields = line.split_whitespace();

    let range = fields.next()?;
    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end <= start {
        return None;
    }

    let perms = Permissions::parse(fields.next()?)?;

    // offset, dev, inode 不参与区域模型
    let _offset = fields.next()?;
    let _dev = fields.next()?;
    let _inode = fields.next()?;

    // pathname 可能含空格 ("[stack]" 或被重命名的文件)，取剩余部分
    let path = fields.collect::<Vec<_>>().join(" ");

    Some(MemoryRegion { start, end, perms, path })
}

/// 读取目标进程的内存映射表
///
/// 返回的区域保持内核给出的升序。进程不存在返回 `ProcessNotFound`，
/// 无权限读取返回 `PermissionDenied`。
pub fn list_regions(pid: i32) -> Result<Vec<MemoryRegion>> {
    if pid <= 0 {
        return Err(InspectError::InvalidArgument(format!("pid must be positive, got {pid}")));
    }

    let maps_path = format!("/proc/{pid}/maps");
    let contents = fs::read_to_string(&maps_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => InspectError::ProcessNotFound(pid),
        _ => InspectError::PermissionDenied(pid),
    })?;

    let mut regions = Vec::new();
    for line in contents.lines() {
        match parse_maps_line(line) {
            Some(region) => regions.push(region),
            None => warn!("skipping unparsable maps line for pid {pid}: {line:?}"),
        }
    }

    Ok(regions)
}
