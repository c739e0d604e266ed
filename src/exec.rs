use crate::cpu::{Cpu, DecodeCtx, DivZeroPolicy, Trap, REG_A0, REG_RA};
use crate::decoder::{sign_extend, AluOp, Cond, Decoded, Extend, MulDivOp, Op};
use crate::memory::{AccessWidth, Bus};

const UIMM12_MASK: u32 = 0xFFF;
const SHAMT_MASK: u32 = 0x1F;

pub trait Executor {
    fn exec<B: Bus>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        ctx: &mut DecodeCtx,
        d: Decoded,
    ) -> Result<(), Trap>;
}

/// Operand set of one instruction: source registers are read once, before
/// the instruction writes anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operands {
    pub rd: usize,
    pub src1: u32,
    pub src2: u32,
    pub imm: u32,
}

impl Operands {
    pub fn fetch(cpu: &Cpu, d: &Decoded) -> Self {
        let src1 = if d.format.reads_rj() { cpu.gpr[d.rj as usize] } else { 0 };
        let src2 = if d.format.reads_rk() { cpu.gpr[d.rk as usize] } else { 0 };
        Self {
            rd: d.rd as usize,
            src1,
            src2,
            imm: d.imm,
        }
    }
}

impl AluOp {
    pub fn apply(self, o: &Operands) -> u32 {
        let (a, b, imm) = (o.src1, o.src2, o.imm);
        match self {
            AluOp::AddW => a.wrapping_add(b),
            AluOp::SubW => a.wrapping_sub(b),
            AluOp::Slt => ((a as i32) < (b as i32)) as u32,
            AluOp::Sltu => (a < b) as u32,
            AluOp::Nor => !(a | b),
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Xor => a ^ b,
            AluOp::SllW => a << (b & SHAMT_MASK),
            AluOp::SrlW => a >> (b & SHAMT_MASK),
            AluOp::SraW => ((a as i32) >> (b & SHAMT_MASK)) as u32,
            AluOp::AddiW => a.wrapping_add(imm),
            AluOp::Slti => ((a as i32) < (imm as i32)) as u32,
            AluOp::Sltui => (a < imm) as u32,
            AluOp::Andi => a & (imm & UIMM12_MASK),
            AluOp::Ori => a | (imm & UIMM12_MASK),
            AluOp::Xori => a ^ (imm & UIMM12_MASK),
            AluOp::SlliW => a << (imm & SHAMT_MASK),
            AluOp::SrliW => a >> (imm & SHAMT_MASK),
            AluOp::SraiW => ((a as i32) >> (imm & SHAMT_MASK)) as u32,
        }
    }
}

impl MulDivOp {
    /// `None` when a zero divisor has to trap under `policy`.
    pub fn apply(self, a: u32, b: u32, policy: DivZeroPolicy) -> Option<u32> {
        let res = match self {
            MulDivOp::MulW => a.wrapping_mul(b),
            MulDivOp::MulhW => ((a as i32 as i64 * b as i32 as i64) >> 32) as u32,
            MulDivOp::MulhWu => ((a as u64 * b as u64) >> 32) as u32,
            _ if b == 0 => match policy {
                DivZeroPolicy::Trap => return None,
                DivZeroPolicy::Saturate => match self {
                    MulDivOp::DivW | MulDivOp::DivWu => u32::MAX,
                    _ => a,
                },
            },
            MulDivOp::DivW => (a as i32).wrapping_div(b as i32) as u32,
            MulDivOp::ModW => (a as i32).wrapping_rem(b as i32) as u32,
            MulDivOp::DivWu => a / b,
            MulDivOp::ModWu => a % b,
        };
        Some(res)
    }
}

impl Cond {
    pub fn holds(self, rj: u32, rd: u32) -> bool {
        match self {
            Cond::Eq => rj == rd,
            Cond::Ne => rj != rd,
            Cond::Lt => (rj as i32) < (rd as i32),
            Cond::Ge => (rj as i32) >= (rd as i32),
            Cond::Ltu => rj < rd,
            Cond::Geu => rj >= rd,
        }
    }
}

/// Word offset of a pc-relative branch, scaled to bytes.
fn offs(imm: u32) -> u32 {
    imm << 2
}

pub struct IntExecutor;

impl IntExecutor {
    fn load<B: Bus>(
        cpu: &mut Cpu,
        bus: &mut B,
        o: &Operands,
        width: AccessWidth,
        ext: Extend,
    ) -> Result<(), Trap> {
        let addr = o.src1.wrapping_add(o.imm);
        let raw = bus
            .read(addr, width)
            .map_err(|source| Trap::Bus { addr, source })?;
        cpu.gpr[o.rd] = match ext {
            Extend::Sign => sign_extend(raw, width.bytes() * 8),
            Extend::Zero => raw,
        };
        Ok(())
    }

    fn store<B: Bus>(cpu: &Cpu, bus: &mut B, o: &Operands, width: AccessWidth) -> Result<(), Trap> {
        let addr = o.src1.wrapping_add(o.imm);
        let val = cpu.gpr[o.rd] & width.mask();
        bus.write(addr, width, val)
            .map_err(|source| Trap::Bus { addr, source })
    }
}

impl Executor for IntExecutor {
    fn exec<B: Bus>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        ctx: &mut DecodeCtx,
        d: Decoded,
    ) -> Result<(), Trap> {
        let o = Operands::fetch(cpu, &d);
        match d.op {
            Op::Alu(op) => {
                cpu.gpr[o.rd] = op.apply(&o);
            }
            Op::MulDiv(op) => {
                cpu.gpr[o.rd] = op
                    .apply(o.src1, o.src2, cpu.cfg.div_zero)
                    .ok_or(Trap::DivideByZero { pc: ctx.pc })?;
            }
            Op::Pcaddu12i => {
                cpu.gpr[o.rd] = ctx.pc.wrapping_add(o.imm << 12);
            }
            Op::Lu12iW => {
                cpu.gpr[o.rd] = o.imm << 12;
            }
            Op::Load(width, ext) => Self::load(cpu, bus, &o, width, ext)?,
            Op::Store(width) => Self::store(cpu, bus, &o, width)?,
            Op::B => ctx.branch_rel(offs(o.imm)),
            Op::Bl => {
                cpu.gpr[REG_RA] = ctx.snpc;
                ctx.branch_rel(offs(o.imm));
            }
            Op::Jirl => {
                // target uses R[rj] as read before rd is written
                cpu.gpr[o.rd] = ctx.snpc;
                ctx.dnpc = o.src1.wrapping_add(offs(o.imm));
            }
            Op::Branch(cond) => {
                if cond.holds(o.src1, cpu.gpr[o.rd]) {
                    ctx.branch_rel(offs(o.imm));
                }
            }
            Op::Dbar | Op::Ibar => {}
            Op::Break => {
                return Err(Trap::Break {
                    pc: ctx.pc,
                    code: cpu.gpr[REG_A0],
                })
            }
            Op::Inv => return Err(Trap::InvalidInstruction { pc: ctx.pc }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(src1: u32, src2: u32, imm: u32) -> Operands {
        Operands { rd: 1, src1, src2, imm }
    }

    #[test]
    fn shifts_mask_amount() {
        assert_eq!(AluOp::SllW.apply(&ops(1, 33, 0)), 2);
        assert_eq!(AluOp::SraW.apply(&ops(0x8000_0000, 31, 0)), 0xFFFF_FFFF);
        // ui5 = 0x10 sign-extends to 0xFFFF_FFF0; only the low five bits count
        assert_eq!(AluOp::SrliW.apply(&ops(0x8000_0000, 0, 0xFFFF_FFF0)), 0x8000);
        assert_eq!(AluOp::SraiW.apply(&ops(0x8000_0000, 0, 0xFFFF_FFF0)), 0xFFFF_8000);
    }

    #[test]
    fn logical_immediates_zero_extend() {
        assert_eq!(AluOp::Ori.apply(&ops(0, 0, 0xFFFF_FFFF)), 0xFFF);
        assert_eq!(AluOp::Andi.apply(&ops(0xFFFF_FFFF, 0, 0xFFFF_F800)), 0x800);
        assert_eq!(AluOp::Xori.apply(&ops(0xF000_0000, 0, 0xFFFF_FFFF)), 0xF000_0FFF);
    }

    #[test]
    fn div_zero_policies() {
        let t = DivZeroPolicy::Trap;
        let s = DivZeroPolicy::Saturate;
        assert_eq!(MulDivOp::DivW.apply(7, 0, t), None);
        assert_eq!(MulDivOp::ModWu.apply(7, 0, t), None);
        assert_eq!(MulDivOp::DivW.apply(7, 0, s), Some(u32::MAX));
        assert_eq!(MulDivOp::DivWu.apply(7, 0, s), Some(u32::MAX));
        assert_eq!(MulDivOp::ModW.apply(7, 0, s), Some(7));
        assert_eq!(MulDivOp::ModWu.apply(7, 0, s), Some(7));
        // multiplies ignore the policy
        assert_eq!(MulDivOp::MulW.apply(7, 0, t), Some(0));
    }

    #[test]
    fn signed_division_overflow_wraps() {
        let min = i32::MIN as u32;
        let neg1 = u32::MAX;
        assert_eq!(MulDivOp::DivW.apply(min, neg1, DivZeroPolicy::Trap), Some(min));
        assert_eq!(MulDivOp::ModW.apply(min, neg1, DivZeroPolicy::Trap), Some(0));
    }

    #[test]
    fn branch_conditions() {
        assert!(Cond::Lt.holds(-1i32 as u32, 0));
        assert!(!Cond::Ltu.holds(-1i32 as u32, 0));
        assert!(Cond::Geu.holds(-1i32 as u32, 0));
        assert!(Cond::Ge.holds(5, 5));
    }
}
