//! Error taxonomy for the inspection core.

use nix::errno::Errno;
use thiserror::Error;

/// 核心错误类型
///
/// `ProcessNotFound` / `PermissionDenied` / `InvalidArgument` 对整次调用是致命的；
/// `ReadFailed` / `EmptyRead` 是活进程的正常状态，调用方按"跳过该窗口/区域"处理。
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("process {0} not found")]
    ProcessNotFound(i32),

    #[error("permission denied inspecting process {0} (need matching uid or CAP_SYS_PTRACE)")]
    PermissionDenied(i32),

    #[error("read at 0x{addr:X} ({len} bytes) failed: {errno}")]
    ReadFailed { addr: u64, len: usize, errno: Errno },

    #[error("read at 0x{addr:X} transferred 0 bytes")]
    EmptyRead { addr: u64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, InspectError>;
