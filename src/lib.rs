pub mod cpu;
pub mod decoder;
pub mod exec;
pub mod disasm;
pub mod instructions;
pub mod memory;

pub mod isa {
    pub mod la32r; // LoongArch32 Reduced
}

pub use cpu::{Cpu, CpuConfig, DivZeroPolicy, Trap};
pub use memory::{AccessWidth, Bus, LinearMemory};
