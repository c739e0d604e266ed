use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::decoder::Decoder;
use crate::disasm::fmt_decoded;
use crate::exec::Executor;
use crate::memory::Bus;

pub const NUM_GPRS: usize = 32;
/// Link register written by `bl`.
pub const REG_RA: usize = 1;
/// First argument register; carries the exit code of `break`.
pub const REG_A0: usize = 4;

pub const REG_NAMES: [&str; NUM_GPRS] = [
    "zero", "ra", "tp", "sp", "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "t0", "t1", "t2",
    "t3", "t4", "t5", "t6", "t7", "t8", "r21", "fp", "s0", "s1", "s2", "s3", "s4", "s5", "s6",
    "s7", "s8",
];

/// LA32R reset vector.
pub const RESET_PC: u32 = 0x1C00_0000;

/// What `div.w`, `div.wu`, `mod.w` and `mod.wu` do with a zero divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivZeroPolicy {
    /// Raise `Trap::DivideByZero` and leave `rd` untouched.
    #[default]
    Trap,
    /// Quotient becomes all ones, remainder becomes the dividend.
    Saturate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub reset_pc: u32,
    pub div_zero: DivZeroPolicy,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            reset_pc: RESET_PC,
            div_zero: DivZeroPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u32,
    pub gpr: [u32; NUM_GPRS],
    pub cfg: CpuConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Invalid instruction at {pc:#010x}")]
    InvalidInstruction { pc: u32 },
    #[error("Break at {pc:#010x} with a0 = {code:#x}")]
    Break { pc: u32, code: u32 },
    #[error("Divide by zero at {pc:#010x}")]
    DivideByZero { pc: u32 },
    #[error("Bus error at {addr:#010x}: {source}")]
    Bus {
        addr: u32,
        #[source]
        source: Error,
    },
}

impl Trap {
    /// `Break` with a zero exit code.
    pub fn is_good(&self) -> bool {
        matches!(self, Trap::Break { code: 0, .. })
    }
}

/// Per-instruction transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeCtx {
    pub pc: u32,
    pub inst: u32,
    /// `pc + 4`
    pub snpc: u32,
    /// Where execution resumes; starts as `snpc`, branches overwrite it.
    pub dnpc: u32,
}

impl DecodeCtx {
    pub fn new(pc: u32, inst: u32, snpc: u32) -> Self {
        Self {
            pc,
            inst,
            snpc,
            dnpc: snpc,
        }
    }

    /// Redirects control flow to `pc + offset`.
    pub fn branch_rel(&mut self, offset: u32) {
        self.dnpc = self.pc.wrapping_add(offset);
    }
}

/// Reads the 4-byte instruction at `*snpc` and advances it.
pub fn inst_fetch<B: Bus>(bus: &mut B, snpc: &mut u32) -> Result<u32, Trap> {
    let addr = *snpc;
    let raw = bus
        .read_u32(addr)
        .map_err(|source| Trap::Bus { addr, source })?;
    *snpc = addr.wrapping_add(4);
    Ok(raw)
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            pc: cfg.reset_pc,
            gpr: [0; NUM_GPRS],
            cfg,
        }
    }

    pub fn reset(&mut self, reset_pc: u32) {
        self.pc = reset_pc;
        self.gpr = [0; NUM_GPRS];
    }

    /// Fetches, decodes and executes one instruction.
    ///
    /// On success `pc` moves to the instruction's dynamic next pc. On a trap
    /// `pc` stays on the trapping instruction. `$zero` is cleared either way.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        let pc = self.pc;
        let mut snpc = pc;
        let inst = inst_fetch(bus, &mut snpc)?;
        let d = dec.decode(inst);
        trace!(target: "itrace", "{pc:#010x}: {inst:08x}  {}", fmt_decoded(&d, pc));

        let mut ctx = DecodeCtx::new(pc, inst, snpc);
        let res = exec.exec(self, bus, &mut ctx, d);
        self.gpr[0] = 0;
        if let Err(trap) = &res {
            debug!(%trap, inst = format_args!("{:08x}", ctx.inst), "instruction trapped");
        }
        res?;
        self.pc = ctx.dnpc;
        Ok(())
    }

    /// Steps until an instruction traps or `max_steps` have executed.
    /// Returns the number of completed steps when the cap is hit.
    pub fn run<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
        max_steps: u64,
    ) -> Result<u64, Trap> {
        for n in 0..max_steps {
            self.step(bus, dec, exec).map_err(|trap| {
                debug!(steps = n, "stopped");
                trap
            })?;
        }
        Ok(max_steps)
    }
}
