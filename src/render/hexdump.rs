//! Hex-dump rendering with highlight ranges.
//!
//! 固定 16 字节一行：偏移、十六进制字节、ASCII 侧栏（可打印字符原样，
//! 其余显示 `.`）。每个字节取第一个覆盖它的高亮的颜色，重叠不混色。

use std::fmt::Write;

use memchr::memmem;

pub const COLOR_RESET: &str = "\x1b[0m";
pub const COLOR_RED: &str = "\x1b[31m";
pub const COLOR_GREEN: &str = "\x1b[32m";
pub const COLOR_YELLOW: &str = "\x1b[33m";
pub const COLOR_BLUE: &str = "\x1b[34m";
pub const COLOR_MAGENTA: &str = "\x1b[35m";
pub const COLOR_CYAN: &str = "\x1b[36m";

const BYTES_PER_ROW: usize = 16;

/// 上下文缓冲区内的一个半开高亮区间
#[derive(Debug, Clone, Copy)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub color: &'static str,
}

/// 先声明的高亮优先
fn highlight_color(pos: usize, highlights: &[Highlight]) -> Option<&'static str> {
    highlights
        .iter()
        .find(|h| pos >= h.start && pos < h.end)
        .map(|h| h.color)
}

/// 渲染字节缓冲区为带高亮的 hex dump
pub fn render_hex_dump(data: &[u8], highlights: &[Highlight]) -> String {
    let mut out = String::new();

    for row_start in (0..data.len()).step_by(BYTES_PER_ROW) {
        let _ = write!(out, "{row_start:04x}: ");

        for col in 0..BYTES_PER_ROW {
            let pos = row_start + col;
            if pos < data.len() {
                match highlight_color(pos, highlights) {
                    Some(color) => {
                        let _ = write!(out, "{color}{:02x}{COLOR_RESET} ", data[pos]);
                    },
                    None => {
                        let _ = write!(out, "{:02x} ", data[pos]);
                    },
                }
            } else {
                out.push_str("   ");
            }
        }

        out.push_str(" |");
        for col in 0..BYTES_PER_ROW {
            let pos = row_start + col;
            if pos >= data.len() {
                break;
            }
            let b = data[pos];
            let ch = if (0x20..=0x7e).contains(&b) { b as char } else { '.' };
            match highlight_color(pos, highlights) {
                Some(color) => {
                    let _ = write!(out, "{color}{ch}{COLOR_RESET}");
                },
                None => out.push(ch),
            }
        }
        out.push_str("|\n");
    }

    out
}

/// 在上下文缓冲区里找出 `pattern` 的每处出现并生成高亮
///
/// 与扫描器相同的前进一字节策略，重叠出现全部标注。
pub fn highlight_occurrences(data: &[u8], pattern: &[u8], color: &'static str) -> Vec<Highlight> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let finder = memmem::Finder::new(pattern);
    let mut highlights = Vec::new();
    let mut from = 0;
    while let Some(rel) = finder.find(&data[from..]) {
        let pos = from + rel;
        highlights.push(Highlight { start: pos, end: pos + pattern.len(), color });
        from = pos + 1;
    }
    highlights
}
