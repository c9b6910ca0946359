//! 远程读取器：跨进程批量读内存
//!
//! 每次调用只发起一次向量化的 process_vm_readv 系统调用
//! （单个本地缓冲区 + 单个远程描述符），避免大段读取时按页拷贝的开销。
//! 短读（非零但小于请求长度）不是错误，结果截断到实际传输的字节数。

use std::io::IoSliceMut;

use nix::sys::uio::{RemoteIoVec, process_vm_readv};
use nix::unistd::Pid;

use crate::error::{InspectError, Result};

/// 扫描逻辑与目标进程之间的读取接口
///
/// 生产实现是 [`ProcessMemory`]；测试用模拟内存替换，
/// 扫描器和引用解析器只依赖这个接口。
pub trait MemorySource: Sync {
    /// 从远程地址 `addr` 读满 `buf` 或部分读取，返回实际传输的字节数。
    ///
    /// 系统调用出错返回 `ReadFailed`；返回 `Ok(0)` 由上层统一转成 `EmptyRead`。
    fn read_into(&self, addr: u64, buf: &mut [u8]) -> Result<usize>;
}

/// 通过 process_vm_readv 访问的活进程内存
#[derive(Debug, Clone, Copy)]
pub struct ProcessMemory {
    pid: Pid,
}

impl ProcessMemory {
    pub fn new(pid: i32) -> Self {
        Self { pid: Pid::from_raw(pid) }
    }

    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }
}

impl MemorySource for ProcessMemory {
    fn read_into(&self, addr: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let len = buf.len();
        let mut local = [IoSliceMut::new(buf)];
        let remote = [RemoteIoVec { base: addr as usize, len }];

        process_vm_readv(self.pid, &mut local, &remote)
            .map_err(|errno| InspectError::ReadFailed { addr, len, errno })
    }
}

/// 从目标进程读取 `len` 字节
///
/// 返回的缓冲区长度等于实际读到的字节数（短读截断）。
/// 零字节传输返回 `EmptyRead` —— 对活进程这是可恢复状态，调用方跳过即可。
pub fn read_remote<S: MemorySource + ?Sized>(source: &S, addr: u64, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let n = source.read_into(addr, &mut buf)?;
    if n == 0 {
        return Err(InspectError::EmptyRead { addr });
    }
    buf.truncate(n);
    Ok(buf)
}

/// 以 `address` 为中心读取一个窗口：起点 `address - before`，长度 `before + after`
///
/// 供 dump 命令使用。起点下溢在任何特权访问前拒绝。
/// 返回 (窗口起始地址, 数据)。
pub fn read_window<S: MemorySource + ?Sized>(
    source: &S,
    address: u64,
    before: usize,
    after: usize,
) -> Result<(u64, Vec<u8>)> {
    let start = address.checked_sub(before as u64).ok_or_else(|| {
        InspectError::InvalidArgument(format!(
            "offset_before {before} underflows address 0x{address:x}"
        ))
    })?;
    let total = before + after;
    if total == 0 {
        return Err(InspectError::InvalidArgument("window size is zero".into()));
    }

    let data = read_remote(source, start, total)?;
    Ok((start, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockMemory;

    struct ZeroSource;

    impl MemorySource for ZeroSource {
        fn read_into(&self, _addr: u64, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }
    }

    struct ShortSource;

    impl MemorySource for ShortSource {
        fn read_into(&self, _addr: u64, buf: &mut [u8]) -> Result<usize> {
            let n = buf.len().min(4);
            buf[..n].fill(0x5a);
            Ok(n)
        }
    }

    #[test]
    fn zero_byte_transfer_is_empty_read() {
        let err = read_remote(&ZeroSource, 0x1000, 64).unwrap_err();
        assert!(matches!(err, InspectError::EmptyRead { addr: 0x1000 }));
    }

    #[test]
    fn short_read_truncates_buffer() {
        let data = read_remote(&ShortSource, 0x1000, 64).unwrap();
        assert_eq!(data, vec![0x5a; 4]);
    }

    #[test]
    fn window_is_centered_on_address() {
        // 区域覆盖 [0x1000, 0x3000)，每个字节记录自己的低 8 位地址
        let mut mem = MockMemory::new();
        let bytes: Vec<u8> = (0..0x2000u64).map(|i| (0x1000 + i) as u8).collect();
        mem.add_region(0x1000, bytes);

        let (start, data) = read_window(&mem, 0x2000, 16, 16).unwrap();
        assert_eq!(start, 0x1ff0);
        assert_eq!(data.len(), 32);
        // 偏移 16 恰好是 address 本身的字节
        assert_eq!(data[16], 0x2000u64 as u8);
        assert_eq!(data[0], 0x1ff0u64 as u8);
    }

    #[test]
    fn underflowing_window_is_rejected_before_any_read() {
        let mut mem = MockMemory::new();
        mem.add_region(0x1000, vec![0u8; 0x100]);

        let err = read_window(&mem, 0x10, 0x20, 0).unwrap_err();
        assert!(matches!(err, InspectError::InvalidArgument(_)));
        assert!(mem.recorded_reads().is_empty());
    }

    #[test]
    fn zero_size_window_is_rejected() {
        let mem = MockMemory::new();
        assert!(matches!(
            read_window(&mem, 0x1000, 0, 0),
            Err(InspectError::InvalidArgument(_))
        ));
    }
}
