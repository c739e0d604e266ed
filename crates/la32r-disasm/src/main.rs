use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use la32r_disasm::{analyze_entries, load_raw_bin, read_u32, read_u8};
use la32r_rs::decoder::Decoder;
use la32r_rs::disasm::fmt_decoded;
use la32r_rs::isa::la32r::La32rDecoder;

#[derive(Parser, Debug)]
#[command(author, version, about = "LA32R disassembler CLI", long_about=None)]
struct Cli {
    /// Load address for the binary in target address space
    #[arg(long, default_value = "0x1c000000", value_parser = parse_u32)]
    base: u32,
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded segments (simple single-segment for raw .bin)
    Sections,
    /// Disassemble a range [start, end) in bytes
    Range {
        /// Start address (hex or dec)
        #[arg(value_parser = parse_u32)]
        start: u32,
        /// End address (hex or dec, exclusive)
        #[arg(value_parser = parse_u32)]
        end: u32,
        /// Show instruction bytes
        #[arg(long)]
        show_bytes: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Follow control flow from entry points
    Analyze {
        /// Entry addresses (hex or dec). Repeat flag to add multiple entries.
        #[arg(long = "entry", value_name = "ADDR", value_parser = parse_u32)]
        entries: Vec<u32>,
        /// Maximum instructions to decode before stopping
        #[arg(long, default_value_t = 100_000usize)]
        max_instr: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write analysis output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn emit(buf: String, out: Option<String>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, buf)?,
        None => print!("{buf}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let img = load_raw_bin(Path::new(&cli.input), cli.base, cli.skip, cli.len)?;

    match cli.cmd {
        Command::Sections => {
            println!("{:<10} {:<10} {:<10} {:<6} {:<6}", "name", "start", "end", "perms", "kind");
            for s in &img.segments {
                println!("{:<10} {:#010x} {:#010x} {:<6} {:<6}", s.name, s.base, s.end(), s.perms, s.kind);
            }
        }
        Command::Range { start, end, show_bytes, out } => {
            anyhow::ensure!(end >= start, "end must be >= start");
            let dec = La32rDecoder::new();
            let mut buf = String::new();
            let mut pc = start;
            while pc < end {
                let Some(raw) = read_u32(&img, pc) else {
                    let _ = writeln!(buf, "{pc:#010x}: <oob>");
                    break;
                };
                let _ = write!(buf, "{pc:#010x}: ");
                if show_bytes {
                    for i in 0..4 {
                        let _ = write!(buf, "{:02x} ", read_u8(&img, pc + i).unwrap_or(0));
                    }
                    buf.push_str("  ");
                }
                let _ = writeln!(buf, "{}", fmt_decoded(&dec.decode(raw), pc));
                pc = pc.wrapping_add(4);
            }
            emit(buf, out)?;
        }
        Command::Analyze { entries, max_instr, format, out } => {
            // default seed: start of first segment
            let mut seeds = if entries.is_empty() {
                img.segments.first().map(|s| s.base).into_iter().collect()
            } else {
                entries
            };
            seeds.sort_unstable();
            seeds.dedup();

            let analysis = analyze_entries(&img, &seeds, max_instr);
            let report = analysis.report(&seeds);
            let buf = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
                OutputFormat::Text => {
                    let mut buf = String::new();
                    let _ = writeln!(buf, "Analysis summary:");
                    let _ = writeln!(buf, "  insts    : {}", analysis.insns.len());
                    let _ = writeln!(buf, "  blocks   : {}", report.blocks.len());
                    let _ = writeln!(buf, "  edges    : {}", report.edges.len());
                    let _ = writeln!(buf, "  halts    : {}", report.halts.len());
                    let _ = writeln!(buf, "  indirect : {}", report.indirect.len());
                    let _ = writeln!(buf, "  mem      : {}", report.mem_access.len());
                    for b in &report.blocks {
                        let _ = writeln!(buf, "\nloc_{:08x}:", b.start);
                        for (i, insn) in b.insns.iter().enumerate() {
                            let _ = writeln!(buf, "  {:#010x}: {insn}", b.start + 4 * i as u32);
                        }
                    }
                    buf
                }
            };
            emit(buf, out)?;
        }
    }

    Ok(())
}
