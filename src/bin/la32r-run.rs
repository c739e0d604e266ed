use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use la32r_rs::{exec::IntExecutor, isa::la32r::La32rDecoder, Cpu, CpuConfig, LinearMemory, Trap};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a raw LA32R binary on the la32r-rs interpreter"
)]
struct Opts {
    /// Entry pc (defaults to the configured reset pc)
    #[arg(short, long, value_parser = parse_u32)]
    entry: Option<u32>,
    /// Load address of the image (defaults to the entry pc)
    #[arg(long, value_parser = parse_u32)]
    base: Option<u32>,
    /// RAM size in bytes
    #[arg(long, default_value_t = 128 * 1024 * 1024)]
    mem_size: usize,
    /// Stop after this many instructions
    #[arg(long, default_value_t = 10_000_000u64)]
    max_steps: u64,
    /// JSON CpuConfig
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write the final CPU state as JSON
    #[arg(long, value_name = "FILE")]
    dump_state: Option<PathBuf>,
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
}

fn parse_u32(s: &str) -> Result<u32, std::num::ParseIntError> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    }
}

fn load_config(opts: &Opts) -> Result<CpuConfig> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => CpuConfig::default(),
    };
    if let Some(entry) = opts.entry {
        cfg.reset_pc = entry;
    }
    Ok(cfg)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let cfg = load_config(&opts)?;
    let base = opts.base.unwrap_or(cfg.reset_pc);

    let mut mem = LinearMemory::with_base(opts.mem_size, base);
    let bytes = std::fs::read(&opts.input)
        .with_context(|| format!("reading image {}", opts.input.display()))?;
    mem.load(base, &bytes)?;
    info!(base = format_args!("{base:#010x}"), len = bytes.len(), "image loaded");

    let mut cpu = Cpu::new(cfg);
    let dec = La32rDecoder::new();
    let exec = IntExecutor;

    let code = match cpu.run(&mut mem, &dec, &exec, opts.max_steps) {
        Ok(steps) => {
            eprintln!("stopped after {steps} instructions at pc = {:#010x}", cpu.pc);
            ExitCode::FAILURE
        }
        Err(Trap::Break { pc, code }) => {
            let verdict = if code == 0 { "HIT GOOD TRAP" } else { "HIT BAD TRAP" };
            eprintln!("{verdict} at pc = {pc:#010x}");
            // a nonzero code must not truncate to a success status
            ExitCode::from(if code != 0 && code as u8 == 0 { 1 } else { code as u8 })
        }
        Err(trap) => {
            eprintln!("TRAP: {trap}");
            ExitCode::FAILURE
        }
    };

    if let Some(path) = &opts.dump_state {
        std::fs::write(path, serde_json::to_string_pretty(&cpu)?)?;
    }

    Ok(code)
}
