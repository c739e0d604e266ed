use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::decoder::{AluOp, Cond, Extend, Format, MulDivOp, Op};
use crate::memory::AccessWidth;

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects: u16 {
const WRITES_RD = 1 << 0;
const LOAD = 1 << 1;
const STORE = 1 << 2;
const BRANCH = 1 << 3; // conditional, pc-relative
const JUMP = 1 << 4; // unconditional
const CALL = 1 << 5; // writes a return address
const INDIRECT = 1 << 6; // target comes from a register
const HALT = 1 << 7; // stops the instruction stream
}
}

/// A 32-position bit template compiled to a masked compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub mask: u32,
    pub bits: u32,
}

impl Pattern {
    /// Compiles a template over `0`, `1` and `?`, most significant bit first.
    /// Spaces and underscores are ignored.
    pub const fn new(pat: &str) -> Self {
        let b = pat.as_bytes();
        let mut mask = 0u32;
        let mut bits = 0u32;
        let mut n = 0;
        let mut i = 0;
        while i < b.len() {
            match b[i] {
                b'0' | b'1' | b'?' => {
                    mask <<= 1;
                    bits <<= 1;
                    if b[i] != b'?' {
                        mask |= 1;
                    }
                    if b[i] == b'1' {
                        bits |= 1;
                    }
                    n += 1;
                }
                b' ' | b'_' => {}
                _ => panic!("instruction pattern: expected 0, 1 or ?"),
            }
            i += 1;
        }
        assert!(n == 32, "instruction pattern must have exactly 32 positions");
        Self { mask, bits }
    }

    #[inline]
    pub const fn matches(&self, raw: u32) -> bool {
        raw & self.mask == self.bits
    }

    /// True if every word this pattern matches is also matched by `other`.
    pub const fn within(&self, other: &Pattern) -> bool {
        other.mask & !self.mask == 0 && self.bits & other.mask == other.bits
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub format: Format,
    pub pattern: Pattern,
    pub effects: Effects,
}

impl InstrDesc {
    const fn new(
        pattern: &str,
        mnemonic: &'static str,
        format: Format,
        op: Op,
        effects: Effects,
    ) -> Self {
        Self {
            op,
            mnemonic,
            format,
            pattern: Pattern::new(pattern),
            effects,
        }
    }
}

const RD: Effects = Effects::WRITES_RD;
const NONE: Effects = Effects::empty();
const LD: Effects = Effects::WRITES_RD.union(Effects::LOAD);
const BR: Effects = Effects::BRANCH;

pub const BREAK: InstrDesc = InstrDesc::new(
    "0000 0000 0010 10100 ????? ????? ?????",
    "break",
    Format::Bare,
    Op::Break,
    Effects::HALT,
);

pub const INVALID: InstrDesc = InstrDesc::new(
    "????????????????? ????? ????? ?????",
    "inv",
    Format::Bare,
    Op::Inv,
    Effects::HALT,
);

/// Templates in priority order. Decoding takes the first match, so order is
/// significant; `BREAK` and the catch-all `INVALID` must stay last.
pub const TABLE: &[InstrDesc] = &[
    InstrDesc::new("0001110 ????? ????? ????? ????? ?????", "pcaddu12i", Format::Reg1Si20, Op::Pcaddu12i, RD),
    InstrDesc::new("0001010 ????? ????? ????? ????? ?????", "lu12i.w", Format::Reg1Si20, Op::Lu12iW, RD),

    InstrDesc::new("0000000000 0100000 ????? ????? ?????", "add.w", Format::Reg3, Op::Alu(AluOp::AddW), RD),
    InstrDesc::new("0000000000 0100010 ????? ????? ?????", "sub.w", Format::Reg3, Op::Alu(AluOp::SubW), RD),
    InstrDesc::new("0000000000 1000000 ????? ????? ?????", "div.w", Format::Reg3, Op::MulDiv(MulDivOp::DivW), RD),
    InstrDesc::new("0000000000 1000001 ????? ????? ?????", "mod.w", Format::Reg3, Op::MulDiv(MulDivOp::ModW), RD),

    InstrDesc::new("0000001010 ???????????? ????? ?????", "addi.w", Format::Reg2Si12, Op::Alu(AluOp::AddiW), RD),
    InstrDesc::new("0000000000 0101010 ????? ????? ?????", "or", Format::Reg3, Op::Alu(AluOp::Or), RD),

    InstrDesc::new("0000001110 ???????????? ????? ?????", "ori", Format::Reg2Ui12, Op::Alu(AluOp::Ori), RD),
    InstrDesc::new("0000001101 ???????????? ????? ?????", "andi", Format::Reg2Ui12, Op::Alu(AluOp::Andi), RD),

    InstrDesc::new("010101 ???????????????? ??????????", "bl", Format::Si26, Op::Bl, Effects::JUMP.union(Effects::CALL)),

    InstrDesc::new("0010100010 ???????????? ????? ?????", "ld.w", Format::Reg2Si12, Op::Load(AccessWidth::Word, Extend::Sign), LD),
    InstrDesc::new("0010100001 ???????????? ????? ?????", "ld.h", Format::Reg2Si12, Op::Load(AccessWidth::Half, Extend::Sign), LD),
    InstrDesc::new("0010100000 ???????????? ????? ?????", "ld.b", Format::Reg2Si12, Op::Load(AccessWidth::Byte, Extend::Sign), LD),
    InstrDesc::new("0010101000 ???????????? ????? ?????", "ld.bu", Format::Reg2Si12, Op::Load(AccessWidth::Byte, Extend::Zero), LD),
    InstrDesc::new("0010101001 ???????????? ????? ?????", "ld.hu", Format::Reg2Si12, Op::Load(AccessWidth::Half, Extend::Zero), LD),

    InstrDesc::new("0010100110 ???????????? ????? ?????", "st.w", Format::Reg2Si12, Op::Store(AccessWidth::Word), Effects::STORE),
    InstrDesc::new("0010100101 ???????????? ????? ?????", "st.h", Format::Reg2Si12, Op::Store(AccessWidth::Half), Effects::STORE),
    InstrDesc::new("0010100100 ???????????? ????? ?????", "st.b", Format::Reg2Si12, Op::Store(AccessWidth::Byte), Effects::STORE),

    InstrDesc::new("0000000000 1000010 ????? ????? ?????", "div.wu", Format::Reg3, Op::MulDiv(MulDivOp::DivWu), RD),
    InstrDesc::new("0000000000 1000011 ????? ????? ?????", "mod.wu", Format::Reg3, Op::MulDiv(MulDivOp::ModWu), RD),

    InstrDesc::new("0000001001 ???????????? ????? ?????", "sltui", Format::Reg2Si12, Op::Alu(AluOp::Sltui), RD),
    InstrDesc::new("0000001000 ???????????? ????? ?????", "slti", Format::Reg2Si12, Op::Alu(AluOp::Slti), RD),

    InstrDesc::new("0000001111 ???????????? ????? ?????", "xori", Format::Reg2Ui12, Op::Alu(AluOp::Xori), RD),

    InstrDesc::new("0000000000 0111000 ????? ????? ?????", "mul.w", Format::Reg3, Op::MulDiv(MulDivOp::MulW), RD),
    InstrDesc::new("0000000000 0111001 ????? ????? ?????", "mulh.w", Format::Reg3, Op::MulDiv(MulDivOp::MulhW), RD),
    InstrDesc::new("0000000000 0111010 ????? ????? ?????", "mulh.wu", Format::Reg3, Op::MulDiv(MulDivOp::MulhWu), RD),

    InstrDesc::new("0000000000 0101110 ????? ????? ?????", "sll.w", Format::Reg3, Op::Alu(AluOp::SllW), RD),
    InstrDesc::new("0000000000 0101111 ????? ????? ?????", "srl.w", Format::Reg3, Op::Alu(AluOp::SrlW), RD),
    InstrDesc::new("0000000000 0110000 ????? ????? ?????", "sra.w", Format::Reg3, Op::Alu(AluOp::SraW), RD),

    InstrDesc::new("0000000001 0000001 ????? ????? ?????", "slli.w", Format::Reg2Ui5, Op::Alu(AluOp::SlliW), RD),
    InstrDesc::new("0000000001 0001001 ????? ????? ?????", "srli.w", Format::Reg2Ui5, Op::Alu(AluOp::SrliW), RD),
    InstrDesc::new("0000000001 0010001 ????? ????? ?????", "srai.w", Format::Reg2Ui5, Op::Alu(AluOp::SraiW), RD),

    InstrDesc::new("0000000000 0101011 ????? ????? ?????", "xor", Format::Reg3, Op::Alu(AluOp::Xor), RD),

    InstrDesc::new("0000000000 0100100 ????? ????? ?????", "slt", Format::Reg3, Op::Alu(AluOp::Slt), RD),
    InstrDesc::new("0000000000 0100101 ????? ????? ?????", "sltu", Format::Reg3, Op::Alu(AluOp::Sltu), RD),

    InstrDesc::new("0000000000 0101001 ????? ????? ?????", "and", Format::Reg3, Op::Alu(AluOp::And), RD),
    InstrDesc::new("0000000000 0101000 ????? ????? ?????", "nor", Format::Reg3, Op::Alu(AluOp::Nor), RD),

    InstrDesc::new("010100 ???????????????? ??????????", "b", Format::Si26, Op::B, Effects::JUMP),

    InstrDesc::new("010011 ???????????????? ????? ?????", "jirl", Format::Reg2Si16, Op::Jirl, Effects::WRITES_RD.union(Effects::JUMP).union(Effects::INDIRECT)),
    InstrDesc::new("010110 ???????????????? ????? ?????", "beq", Format::Reg2Si16, Op::Branch(Cond::Eq), BR),
    InstrDesc::new("010111 ???????????????? ????? ?????", "bne", Format::Reg2Si16, Op::Branch(Cond::Ne), BR),
    InstrDesc::new("011000 ???????????????? ????? ?????", "blt", Format::Reg2Si16, Op::Branch(Cond::Lt), BR),
    InstrDesc::new("011001 ???????????????? ????? ?????", "bge", Format::Reg2Si16, Op::Branch(Cond::Ge), BR),
    InstrDesc::new("011010 ???????????????? ????? ?????", "bltu", Format::Reg2Si16, Op::Branch(Cond::Ltu), BR),
    InstrDesc::new("011011 ???????????????? ????? ?????", "bgeu", Format::Reg2Si16, Op::Branch(Cond::Geu), BR),

    InstrDesc::new("0011100001 1100100 ????? ????? ?????", "dbar", Format::Hint16, Op::Dbar, NONE),
    InstrDesc::new("0011100001 1100101 ????? ????? ?????", "ibar", Format::Hint16, Op::Ibar, NONE),

    BREAK,
    INVALID,
];

/// Table entry for `op`; ops absent from the table map to `INVALID`.
pub fn describe(op: Op) -> &'static InstrDesc {
    TABLE.iter().find(|d| d.op == op).unwrap_or(&INVALID)
}
