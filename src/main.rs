//! memscout CLI: list regions, search patterns, dump memory windows.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use memscout::render::{
    COLOR_CYAN, COLOR_GREEN, COLOR_RED, Highlight, highlight_occurrences, render_hex_dump,
};
use memscout::{
    HighlightPattern, InspectError, POINTER_SIZE, ProcessMemory, ScanConfig, SearchMatch,
    find_references, list_regions, parallel_pattern_search, read_window,
};

#[derive(Parser)]
#[command(name = "memscout", version, about = "Inspect the virtual address space of a running process")]
struct Cli {
    /// Target process id
    pid: i32,

    /// Text pattern to search for across all readable regions
    #[arg(long)]
    pattern: Option<String>,

    /// Extra byte patterns to highlight inside match contexts (text, rendered green)
    #[arg(long = "highlight")]
    highlights: Vec<String>,

    /// Also resolve pointer references to every match address
    #[arg(long)]
    find_refs: bool,

    /// Backing-path exclusion regex (use an empty string to disable the default)
    #[arg(long)]
    exclude: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Hex-dump memory around an address, highlighting the byte at the address
    Dump {
        /// Address, 0x-prefixed hex or decimal
        address: String,
        /// Bytes to read before the address
        offset_before: usize,
        /// Bytes to read after the address
        offset_after: usize,
    },
}

/// 接受 0x 前缀十六进制或十进制字面量
fn parse_address(s: &str) -> Result<u64, InspectError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| InspectError::InvalidArgument(format!("invalid address {s:?}")))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.pid <= 0 {
        bail!("invalid pid {}: must be positive", cli.pid);
    }
    let memory = ProcessMemory::new(cli.pid);

    match &cli.command {
        Some(Command::Dump { address, offset_before, offset_after }) => {
            let address = parse_address(address)?;
            run_dump(&memory, address, *offset_before, *offset_after)
        },
        None => run_inspect(&memory, &cli),
    }
}

fn run_dump(memory: &ProcessMemory, address: u64, before: usize, after: usize) -> Result<()> {
    let (start, data) = read_window(memory, address, before, after)
        .with_context(|| format!("failed to read memory at 0x{address:016x}"))?;

    println!("\n=== Memory at address 0x{address:016x} (-{before} to +{after} bytes) ===\n");
    println!("Start: 0x{start:016x}");
    println!("End:   0x{:016x}", start + data.len() as u64);
    println!("Size:  {} bytes\n", data.len());

    let highlights = [Highlight { start: before, end: before + 1, color: COLOR_RED }];
    print!("{}", render_hex_dump(&data, &highlights));
    println!();

    Ok(())
}

fn run_inspect(memory: &ProcessMemory, cli: &Cli) -> Result<()> {
    println!("Parsing memory maps for PID {}...", memory.pid());
    let regions = list_regions(memory.pid())
        .with_context(|| format!("failed to read memory maps of pid {}", memory.pid()))?;

    println!("Found {} memory regions\n", regions.len());
    for (i, region) in regions.iter().enumerate() {
        println!("[{i}] {region}");
    }

    let Some(pattern) = &cli.pattern else {
        return Ok(());
    };

    let mut config = ScanConfig::new(pattern.clone().into_bytes());
    match cli.exclude.as_deref() {
        Some("") => config.exclude_path = None,
        Some(custom) => config.exclude_path = Some(custom.to_string()),
        None => {},
    }
    config.extra_highlights = cli
        .highlights
        .iter()
        .map(|p| HighlightPattern { pattern: p.clone().into_bytes(), color: COLOR_GREEN })
        .collect();

    println!("\nSearching for pattern {pattern:?} across all readable regions...");
    let matches = parallel_pattern_search(memory, &regions, &config)?;
    println!("\nFound {} matches:\n", matches.len());

    for (i, m) in matches.iter().enumerate() {
        print_match(i, m, &config);
    }

    if cli.find_refs && !matches.is_empty() {
        print_references(memory, &regions, &matches, &config)?;
    }

    Ok(())
}

fn print_match(index: usize, m: &SearchMatch, config: &ScanConfig) {
    println!("Match #{}:", index + 1);
    println!("  Address:  0x{:016x}", m.address);
    println!(
        "  Region:   addr=0x{:016x}-0x{:016x} ({:8} bytes) {}",
        m.region.start,
        m.region.end,
        m.region.size(),
        m.region.path
    );
    println!("  Context (with match highlighted):");

    // 主模式红色优先，附加模式排在其后（重叠时先声明者胜出）
    let mut highlights = vec![Highlight {
        start: m.pattern_offset,
        end: m.pattern_offset + m.pattern_length,
        color: COLOR_RED,
    }];
    for extra in &config.extra_highlights {
        highlights.extend(highlight_occurrences(&m.context, &extra.pattern, extra.color));
    }

    print!("{}", render_hex_dump(&m.context, &highlights));
    println!();
}

fn print_references(
    memory: &ProcessMemory,
    regions: &[memscout::MemoryRegion],
    matches: &[SearchMatch],
    config: &ScanConfig,
) -> Result<()> {
    println!("\n=== Finding references to match addresses ===\n");

    let targets: Vec<u64> = matches.iter().map(|m| m.address).collect();
    println!("Searching for pointers to {} addresses...", targets.len());

    let references = find_references(memory, regions, &targets, config)?;
    let total: usize = references.values().map(Vec::len).sum();
    println!("Found {total} total references\n");

    for (i, m) in matches.iter().enumerate() {
        let refs = &references[&m.address];
        if refs.is_empty() {
            continue;
        }

        println!("References to Match #{} (0x{:016x}): {} found", i + 1, m.address, refs.len());
        for (j, r) in refs.iter().enumerate() {
            if j >= 5 {
                println!("  ... and {} more references", refs.len() - j);
                break;
            }
            println!("  Ref #{}:", j + 1);
            println!("    Ref Address: 0x{:016x}", r.ref_address);
            println!(
                "    Region:      addr=0x{:016x}-0x{:016x} {}",
                r.region.start, r.region.end, r.region.path
            );
            println!("    Context:");

            let highlights = [Highlight {
                start: r.ref_offset,
                end: r.ref_offset + POINTER_SIZE,
                color: COLOR_CYAN,
            }];
            print!("{}", render_hex_dump(&r.context, &highlights));
            println!();
        }
        println!();
    }

    Ok(())
}
