//! Mock memory source for scanner and resolver tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;

use crate::error::{InspectError, Result};
use crate::proc::{MemorySource, MemoryRegion, Permissions};

const RW_PERMS: Permissions =
    Permissions { read: true, write: true, execute: false, shared: false };

enum Segment {
    Data { start: u64, bytes: Vec<u8> },
    /// 区域在目录里可读，但每次读取都失败 —— 模拟映射在快照后消失
    Unreadable { start: u64, size: u64 },
}

/// 模拟的目标进程内存：若干段数据 + 可选的不可读段
///
/// 记录每次读取调用并跟踪并发读取数，用于验证窗口推进和并发上限。
pub struct MockMemory {
    segments: Vec<Segment>,
    read_delay: Option<Duration>,
    reads: Mutex<Vec<(u64, usize)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockMemory {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            read_delay: None,
            reads: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// 添加一段可读数据，返回对应的区域描述符
    pub fn add_region(&mut self, start: u64, bytes: Vec<u8>) -> MemoryRegion {
        self.add_region_with_path(start, bytes, "")
    }

    pub fn add_region_with_path(&mut self, start: u64, bytes: Vec<u8>, path: &str) -> MemoryRegion {
        let region = MemoryRegion {
            start,
            end: start + bytes.len() as u64,
            perms: RW_PERMS,
            path: path.to_string(),
        };
        self.segments.push(Segment::Data { start, bytes });
        region
    }

    /// 添加一段目录可见但读取必败的区域
    pub fn add_unreadable(&mut self, start: u64, size: u64) -> MemoryRegion {
        self.segments.push(Segment::Unreadable { start, size });
        MemoryRegion { start, end: start + size, perms: RW_PERMS, path: String::new() }
    }

    /// 人为放慢读取，让并发读窗口互相重叠
    pub fn set_read_delay(&mut self, delay: Duration) {
        self.read_delay = Some(delay);
    }

    pub fn recorded_reads(&self) -> Vec<(u64, usize)> {
        self.reads.lock().unwrap().clone()
    }

    pub fn max_concurrent_reads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl MemorySource for MockMemory {
    fn read_into(&self, addr: u64, buf: &mut [u8]) -> Result<usize> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            thread::sleep(delay);
        }

        self.reads.lock().unwrap().push((addr, buf.len()));

        let result = (|| {
            for segment in &self.segments {
                match segment {
                    Segment::Data { start, bytes } => {
                        let end = start + bytes.len() as u64;
                        if addr >= *start && addr < end {
                            let offset = (addr - start) as usize;
                            let n = buf.len().min(bytes.len() - offset);
                            buf[..n].copy_from_slice(&bytes[offset..offset + n]);
                            return Ok(n);
                        }
                    },
                    Segment::Unreadable { start, size } => {
                        if addr >= *start && addr < start + size {
                            return Err(InspectError::ReadFailed {
                                addr,
                                len: buf.len(),
                                errno: Errno::EIO,
                            });
                        }
                    },
                }
            }
            Err(InspectError::ReadFailed { addr, len: buf.len(), errno: Errno::EFAULT })
        })();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
