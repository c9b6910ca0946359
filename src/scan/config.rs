//! 扫描配置
//!
//! 搜索模式、上下文窗口和排除策略全部作为显式配置传入编排器，
//! 不存在编译期写死的搜索项。

/// 单个扫描窗口的默认容量（1 GiB）
///
/// 区域可能有几十 GiB，整体物化会打爆内存；窗口上限约束了峰值占用。
pub const DEFAULT_WINDOW_SIZE: usize = 1 << 30;

/// 同时在飞的区域扫描任务上限
///
/// 每个在飞任务最多持有一个窗口缓冲区，上限同时约束了聚合内存占用。
pub const DEFAULT_MAX_TASKS: usize = 16;

/// 模式搜索的默认上下文（匹配前/后各保留的字节数）
pub const DEFAULT_CONTEXT: usize = 1024;

/// 默认排除的映射文件名模式（已知高噪声的数据文件）
pub const DEFAULT_EXCLUDE_PATH: &str = r"data\d+\.rda";

/// 附加高亮模式：在匹配上下文里标注的额外字节序列
#[derive(Debug, Clone)]
pub struct HighlightPattern {
    pub pattern: Vec<u8>,
    pub color: &'static str,
}

/// 一次模式扫描的完整配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 要搜索的字节模式
    pub pattern: Vec<u8>,
    /// 匹配前保留的上下文字节数
    pub context_before: usize,
    /// 匹配后保留的上下文字节数
    pub context_after: usize,
    /// 扫描窗口容量
    pub window_size: usize,
    /// 并发区域扫描上限
    pub max_tasks: usize,
    /// 映射文件路径排除模式（正则），None 表示不排除
    pub exclude_path: Option<String>,
    /// 展示层的附加高亮
    pub extra_highlights: Vec<HighlightPattern>,
}

impl ScanConfig {
    pub fn new(pattern: Vec<u8>) -> Self {
        Self {
            pattern,
            context_before: DEFAULT_CONTEXT,
            context_after: DEFAULT_CONTEXT,
            window_size: DEFAULT_WINDOW_SIZE,
            max_tasks: DEFAULT_MAX_TASKS,
            exclude_path: Some(DEFAULT_EXCLUDE_PATH.to_string()),
            extra_highlights: Vec::new(),
        }
    }
}
