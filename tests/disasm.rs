use la32r_rs::decoder::Decoder;
use la32r_rs::disasm::fmt_decoded;
use la32r_rs::isa::la32r::La32rDecoder;

fn dis(raw: u32, pc: u32) -> String {
    let dec = La32rDecoder::new();
    fmt_decoded(&dec.decode(raw), pc)
}

#[test]
fn register_and_immediate_forms() {
    // add.w $r1, $r2, $r3
    assert_eq!(dis(0x0010_0C41, 0), "add.w $ra, $tp, $sp");
    // addi.w $a0, $zero, -1
    assert_eq!(dis(0x0280_0000 | (0xFFF << 10) | 4, 0), "addi.w $a0, $zero, -1");
    // ori $t0, $zero, 0xfff
    assert_eq!(dis(0x0380_0000 | (0xFFF << 10) | 12, 0), "ori $t0, $zero, 0xfff");
    // slli.w $a0, $a0, 16
    assert_eq!(dis(0x0040_8000 | (16 << 10) | (4 << 5) | 4, 0), "slli.w $a0, $a0, 16");
    // lu12i.w $a0, -1
    assert_eq!(dis(0x1400_0000 | (0xF_FFFF << 5) | 4, 0), "lu12i.w $a0, -1");
}

#[test]
fn memory_forms() {
    // ld.w $a0, $sp, -8
    assert_eq!(dis(0x2880_0000 | (0xFF8 << 10) | (3 << 5) | 4, 0), "ld.w $a0, $sp, -8");
    // st.b $a1, $a0, 3
    assert_eq!(dis(0x2900_0000 | (3 << 10) | (4 << 5) | 5, 0), "st.b $a1, $a0, 3");
}

#[test]
fn control_flow_targets_are_absolute() {
    let pc = 0x1C00_0000;
    // beq $a0, $a1, +4 words
    assert_eq!(dis(0x5800_0000 | (4 << 10) | (4 << 5) | 5, pc), "beq $a0, $a1, 0x1c000010");
    // bl +1 word
    assert_eq!(dis(0x5400_0000 | (1 << 10), pc), "bl 0x1c000004");
    // b -1 word
    assert_eq!(dis(0x5000_0000 | (0xFFFF << 10) | 0x3FF, pc), "b 0x1bfffffc");
    // jirl $zero, $ra, 0
    assert_eq!(dis(0x4C00_0000 | (1 << 5), pc), "jirl $zero, $ra, 0");
}

#[test]
fn system_and_invalid() {
    assert_eq!(dis(0x002A_0000, 0), "break 0x0");
    assert_eq!(dis(0x3872_0000, 0), "dbar 0x0");
    assert_eq!(dis(0xFFFF_FFFF, 0), ".word 0xffffffff");
}
