//! Human-facing output: hex dumps with highlight ranges.

pub mod hexdump;

pub use hexdump::{
    COLOR_BLUE, COLOR_CYAN, COLOR_GREEN, COLOR_MAGENTA, COLOR_RED, COLOR_RESET, COLOR_YELLOW,
    Highlight, highlight_occurrences, render_hex_dump,
};
