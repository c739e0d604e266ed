use la32r_rs::cpu::RESET_PC;
use la32r_rs::exec::IntExecutor;
use la32r_rs::isa::la32r::La32rDecoder;
use la32r_rs::{Cpu, CpuConfig, LinearMemory, Trap};
use pretty_assertions::assert_eq;

fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[test]
fn sum_loop_at_reset_vector() {
    // 0x00: addi.w $t0, $zero, 10
    // 0x04: addi.w $a0, $zero, 0
    // 0x08: add.w  $a0, $a0, $t0
    // 0x0c: addi.w $t0, $t0, -1
    // 0x10: bne    $t0, $zero, -2 (words)
    // 0x14: break  0
    let prog = [
        0x0280_0000 | (10 << 10) | 12,
        0x0280_0000 | 4,
        0x0010_0000 | (12 << 10) | (4 << 5) | 4,
        0x0280_0000 | (0xFFF << 10) | (12 << 5) | 12,
        0x5C00_0000 | (0xFFFE << 10) | (12 << 5),
        0x002A_0000,
    ];
    let mut mem = LinearMemory::with_base(0x1000, RESET_PC);
    mem.load(RESET_PC, &words_to_bytes(&prog)).unwrap();

    let mut cpu = Cpu::new(CpuConfig::default());
    assert_eq!(cpu.pc, RESET_PC);
    let res = cpu.run(&mut mem, &La32rDecoder::new(), &IntExecutor, 1_000);
    match res {
        Err(Trap::Break { pc, code }) => {
            assert_eq!(pc, RESET_PC + 0x14);
            assert_eq!(code, 55);
        }
        other => panic!("expected break, got {other:?}"),
    }
    assert_eq!(cpu.gpr[12], 0);
}

#[test]
fn call_and_return_through_link_register() {
    // 0x00: bl     +3 (words) -> 0x0c
    // 0x04: addi.w $a0, $a0, 1
    // 0x08: break  0
    // 0x0c: addi.w $a0, $zero, 41
    // 0x10: jirl   $zero, $ra, 0
    let prog = [
        0x5400_0000 | (3 << 10),
        0x0280_0000 | (1 << 10) | (4 << 5) | 4,
        0x002A_0000,
        0x0280_0000 | (41 << 10) | 4,
        0x4C00_0000 | (1 << 5),
    ];
    let mut mem = LinearMemory::with_base(0x100, 0x8000_0000);
    mem.load(0x8000_0000, &words_to_bytes(&prog)).unwrap();

    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.reset(0x8000_0000);
    let res = cpu.run(&mut mem, &La32rDecoder::new(), &IntExecutor, 100);
    assert!(matches!(res, Err(Trap::Break { pc: 0x8000_0008, code: 42 })));
    assert_eq!(cpu.gpr[1], 0x8000_0004);
}
