use la32r_rs::exec::IntExecutor;
use la32r_rs::isa::la32r::La32rDecoder;
use la32r_rs::{Bus, Cpu, CpuConfig, DivZeroPolicy, LinearMemory, Trap};

fn enc_3r(op: u32, rd: u32, rj: u32, rk: u32) -> u32 {
    op | (rk << 10) | (rj << 5) | rd
}

const MUL_W: u32 = 0x001C_0000;
const MULH_W: u32 = 0x001C_8000;
const MULH_WU: u32 = 0x001D_0000;
const DIV_W: u32 = 0x0020_0000;
const MOD_W: u32 = 0x0020_8000;
const DIV_WU: u32 = 0x0021_0000;
const MOD_WU: u32 = 0x0021_8000;

fn setup(words: &[u32], cfg: CpuConfig) -> (Cpu, LinearMemory) {
    let mut mem = LinearMemory::new(128);
    for (i, w) in words.iter().enumerate() {
        mem.write_u32(i as u32 * 4, *w).unwrap();
    }
    let mut cpu = Cpu::new(cfg);
    cpu.reset(0);
    (cpu, mem)
}

fn eval(op: u32, a: u32, b: u32) -> u32 {
    let (mut cpu, mut mem) = setup(&[enc_3r(op, 4, 5, 6)], CpuConfig::default());
    cpu.gpr[5] = a;
    cpu.gpr[6] = b;
    cpu.step(&mut mem, &La32rDecoder::new(), &IntExecutor).unwrap();
    cpu.gpr[4]
}

#[test]
fn multiply_low_and_high_words() {
    assert_eq!(eval(MUL_W, 0x1_0000, 0x1_0000), 0);
    assert_eq!(eval(MUL_W, -3i32 as u32, 7) as i32, -21);

    assert_eq!(eval(MULH_W, 0x1_0000, 0x1_0000), 1);
    assert_eq!(eval(MULH_W, -1i32 as u32, 1), 0xFFFF_FFFF);
    assert_eq!(eval(MULH_W, 0x8000_0000, 0x8000_0000), 0x4000_0000);

    assert_eq!(eval(MULH_WU, 0xFFFF_FFFF, 2), 1);
    assert_eq!(eval(MULH_WU, 0xFFFF_FFFF, 0xFFFF_FFFF), 0xFFFF_FFFE);
}

#[test]
fn signed_and_unsigned_divide() {
    assert_eq!(eval(DIV_W, -7i32 as u32, 2) as i32, -3);
    assert_eq!(eval(MOD_W, -7i32 as u32, 2) as i32, -1);
    assert_eq!(eval(DIV_WU, 0xFFFF_FFFE, 2), 0x7FFF_FFFF);
    assert_eq!(eval(MOD_WU, 0xFFFF_FFFF, 10), 5);
    // i32::MIN / -1 wraps instead of faulting
    assert_eq!(eval(DIV_W, 0x8000_0000, 0xFFFF_FFFF), 0x8000_0000);
    assert_eq!(eval(MOD_W, 0x8000_0000, 0xFFFF_FFFF), 0);
}

#[test]
fn divide_by_zero_traps_by_default() {
    for op in [DIV_W, MOD_W, DIV_WU, MOD_WU] {
        let (mut cpu, mut mem) = setup(&[enc_3r(op, 4, 5, 6)], CpuConfig::default());
        cpu.gpr[4] = 0xAAAA;
        cpu.gpr[5] = 9;
        let res = cpu.step(&mut mem, &La32rDecoder::new(), &IntExecutor);
        assert!(matches!(res, Err(Trap::DivideByZero { pc: 0 })));
        assert_eq!(cpu.gpr[4], 0xAAAA);
        assert_eq!(cpu.pc, 0);
    }
}

#[test]
fn divide_by_zero_saturates_when_configured() {
    let cfg = CpuConfig {
        div_zero: DivZeroPolicy::Saturate,
        ..CpuConfig::default()
    };
    let prog = [
        enc_3r(DIV_W, 7, 5, 6),
        enc_3r(MOD_W, 8, 5, 6),
        enc_3r(DIV_WU, 9, 5, 6),
        enc_3r(MOD_WU, 10, 5, 6),
    ];
    let (mut cpu, mut mem) = setup(&prog, cfg);
    cpu.gpr[5] = -9i32 as u32;
    let dec = La32rDecoder::new();
    for _ in prog {
        cpu.step(&mut mem, &dec, &IntExecutor).unwrap();
    }
    assert_eq!(cpu.gpr[7], 0xFFFF_FFFF);
    assert_eq!(cpu.gpr[8], -9i32 as u32);
    assert_eq!(cpu.gpr[9], 0xFFFF_FFFF);
    assert_eq!(cpu.gpr[10], -9i32 as u32);
    assert_eq!(cpu.pc, 16);
}
