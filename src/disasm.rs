use crate::cpu::REG_NAMES;
use crate::decoder::{Decoded, Format, Op};
use crate::instructions::describe;

fn reg(idx: u8) -> String {
    format!("${}", REG_NAMES[idx as usize & 0x1F])
}

/// Absolute target of a pc-relative branch at `pc`.
fn target(pc: u32, imm: u32) -> u32 {
    pc.wrapping_add(imm << 2)
}

/// Renders `d` (fetched from `pc`) in LoongArch assembly syntax.
pub fn fmt_decoded(d: &Decoded, pc: u32) -> String {
    let mn = describe(d.op).mnemonic;
    let (rd, rj, rk) = (reg(d.rd), reg(d.rj), reg(d.rk));
    match d.op {
        Op::Inv => format!(".word {:#010x}", d.raw),
        Op::Break => format!("{mn} {:#x}", d.raw & 0x7FFF),
        Op::Dbar | Op::Ibar => format!("{mn} {:#x}", d.imm & 0x7FFF),
        Op::B | Op::Bl => format!("{mn} {:#x}", target(pc, d.imm)),
        Op::Jirl => format!("{mn} {rd}, {rj}, {}", (d.imm << 2) as i32),
        Op::Branch(_) => format!("{mn} {rj}, {rd}, {:#x}", target(pc, d.imm)),
        _ => match d.format {
            Format::Reg3 => format!("{mn} {rd}, {rj}, {rk}"),
            Format::Reg2Ui12 => format!("{mn} {rd}, {rj}, {:#x}", d.imm & 0xFFF),
            Format::Reg2Ui5 => format!("{mn} {rd}, {rj}, {}", d.imm & 0x1F),
            Format::Reg1Si20 => format!("{mn} {rd}, {}", d.imm as i32),
            _ => format!("{mn} {rd}, {rj}, {}", d.imm as i32),
        },
    }
}
