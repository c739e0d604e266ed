use serde::{Deserialize, Serialize};

use crate::memory::AccessWidth;

/// Register-to-register and register-immediate integer operations.
/// Every variant writes `rd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    AddW,
    SubW,
    Slt,
    Sltu,
    Nor,
    And,
    Or,
    Xor,
    SllW,
    SrlW,
    SraW,
    AddiW,
    Slti,
    Sltui,
    Andi,
    Ori,
    Xori,
    SlliW,
    SrliW,
    SraiW,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MulDivOp {
    MulW,
    MulhW,
    MulhWu,
    DivW,
    ModW,
    DivWu,
    ModWu,
}

/// Condition of a two-register compare-and-branch, evaluated as `R[rj] <cond> R[rd]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extend {
    Sign,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Alu(AluOp),
    MulDiv(MulDivOp),
    Pcaddu12i,
    Lu12iW,
    Load(AccessWidth, Extend),
    Store(AccessWidth),
    B,
    Bl,
    Jirl,
    Branch(Cond),
    Dbar,
    Ibar,
    Break,
    Inv,
}

/// Addressing-mode tag: which operand fields an encoding carries and how its
/// immediate is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    /// rd, rj, rk
    Reg3,
    /// rd, rj, si12 at [21:10]
    Reg2Si12,
    /// rd, rj, ui12 at [21:10]; still sign-extended here, users mask it
    Reg2Ui12,
    /// rd, rj, offs16 at [25:10]
    Reg2Si16,
    /// rd, si20 at [24:5]
    Reg1Si20,
    /// offs26: [25:10] low half, [9:0] high bits
    Si26,
    /// rd, rj, ui5 at [14:10]
    Reg2Ui5,
    /// hint at [15:0]
    Hint16,
    Bare,
}

impl Format {
    /// Extracts and sign-extends this format's immediate from `raw`.
    pub const fn immediate(self, raw: u32) -> u32 {
        match self {
            Format::Reg3 | Format::Bare => 0,
            Format::Reg2Si12 | Format::Reg2Ui12 => sign_extend(bits(raw, 21, 10), 12),
            Format::Reg2Si16 => sign_extend(bits(raw, 25, 10), 16),
            Format::Reg1Si20 => sign_extend(bits(raw, 24, 5), 20),
            Format::Si26 => sign_extend(bits(raw, 25, 10) | (bits(raw, 9, 0) << 16), 26),
            Format::Reg2Ui5 => sign_extend(bits(raw, 14, 10), 5),
            Format::Hint16 => sign_extend(bits(raw, 15, 0), 16),
        }
    }

    /// Whether the format reads `R[rj]` as its first source.
    pub const fn reads_rj(self) -> bool {
        matches!(
            self,
            Format::Reg3
                | Format::Reg2Si12
                | Format::Reg2Ui12
                | Format::Reg2Si16
                | Format::Reg1Si20
                | Format::Reg2Ui5
        )
    }

    pub const fn reads_rk(self) -> bool {
        matches!(self, Format::Reg3)
    }
}

/// Bits `hi..=lo` of `word`, shifted down to bit 0.
#[inline]
pub const fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    (word >> lo) & (u32::MAX >> (31 - (hi - lo)))
}

/// Replicates bit `width - 1` of `value` into all higher bits.
#[inline]
pub const fn sign_extend(value: u32, width: u32) -> u32 {
    let s = 32 - width;
    ((value << s) as i32 >> s) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub format: Format,
    pub raw: u32,
    pub rd: u8,
    pub rj: u8,
    pub rk: u8,
    /// Immediate already extended per `format`.
    pub imm: u32,
}

impl Decoded {
    pub const fn new(op: Op, format: Format, raw: u32) -> Self {
        Self {
            op,
            format,
            raw,
            rd: bits(raw, 4, 0) as u8,
            rj: bits(raw, 9, 5) as u8,
            rk: bits(raw, 14, 10) as u8,
            imm: format.immediate(raw),
        }
    }
}

/// Maps a raw instruction word to exactly one decoded instruction.
/// Undecodable words come back as `Op::Inv`.
pub trait Decoder {
    fn decode(&self, raw32: u32) -> Decoded;
}
