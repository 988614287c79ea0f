//! Cross-validation of emitted A32 words against yaxpeax-arm (ARMv7).
//!
//! Each instruction is built with `arm_ir::create`, encoded, and decoded by
//! an independent disassembler; the opcode it reports must match.

use arm_ir::{create, encode, AddrMode, Instruction, Opcode as IrOpcode, Operand, Reg};
use yaxpeax_arch::{Decoder as _, U8Reader};
use yaxpeax_arm::armv7::{InstDecoder, Opcode};

/// Encode with arm-ir, decode with yaxpeax-arm, return opcode + formatted string.
fn encode_and_decode(instr: &Instruction) -> (Opcode, String) {
    let mut bytes = [0u8; 4];
    encode(instr, &mut bytes, 0x1000).unwrap_or_else(|e| panic!("arm-ir failed: {instr}: {e}"));
    let decoder = InstDecoder::default();
    let mut reader = U8Reader::new(&bytes);
    let inst = decoder.decode(&mut reader).unwrap_or_else(|e| {
        panic!("yaxpeax-arm(v7) failed to decode {instr} → {bytes:02X?}: {e}")
    });
    (inst.opcode, format!("{}", inst))
}

fn verify(instr: Instruction, expected: Opcode) {
    let (opcode, formatted) = encode_and_decode(&instr);
    assert_eq!(
        opcode, expected,
        "opcode mismatch for {instr}: yaxpeax decoded `{formatted}`"
    );
}

// ── Data processing ─────────────────────────────────────────────────────

#[test]
fn xval_dp_register() {
    let cases = [
        (IrOpcode::AddReg, Opcode::ADD),
        (IrOpcode::SubReg, Opcode::SUB),
        (IrOpcode::AndReg, Opcode::AND),
        (IrOpcode::OrrReg, Opcode::ORR),
        (IrOpcode::EorReg, Opcode::EOR),
        (IrOpcode::BicReg, Opcode::BIC),
        (IrOpcode::RsbReg, Opcode::RSB),
        (IrOpcode::RscReg, Opcode::RSC),
        (IrOpcode::AdcReg, Opcode::ADC),
        (IrOpcode::SbcReg, Opcode::SBC),
    ];
    for (op, expected) in cases {
        verify(create::dp_reg(op, Reg::R0, Reg::R1, Reg::R2), expected);
    }
}

#[test]
fn xval_dp_move_and_test() {
    verify(create::dp_move_reg(IrOpcode::MovReg, Reg::R0, Reg::R1), Opcode::MOV);
    verify(create::dp_move_reg(IrOpcode::MvnReg, Reg::R0, Reg::R1), Opcode::MVN);
    verify(create::dp_test_reg(IrOpcode::CmpReg, Reg::R0, Reg::R1), Opcode::CMP);
    verify(create::dp_test_reg(IrOpcode::CmnReg, Reg::R0, Reg::R1), Opcode::CMN);
    verify(create::dp_test_reg(IrOpcode::TstReg, Reg::R0, Reg::R1), Opcode::TST);
    verify(create::dp_test_reg(IrOpcode::TeqReg, Reg::R0, Reg::R1), Opcode::TEQ);
}

#[test]
fn xval_dp_immediate() {
    verify(create::dp_imm(IrOpcode::AddImm, Reg::R0, Reg::R1, 42), Opcode::ADD);
    verify(create::dp_imm(IrOpcode::SubImm, Reg::R0, Reg::R1, 0x3FC), Opcode::SUB);
    verify(create::dp_move_imm(IrOpcode::MovImm, Reg::R0, 0xFF00_0000), Opcode::MOV);
    verify(create::dp_test_imm(IrOpcode::CmpImm, Reg::R0, 0), Opcode::CMP);
}

#[test]
fn xval_shifted_operands() {
    use arm_ir::ShiftType;
    verify(
        create::dp_reg_shifted(IrOpcode::AddReg, Reg::R0, Reg::R1, Reg::R2, ShiftType::Lsl, 3),
        Opcode::ADD,
    );
    verify(
        create::dp_move_shifted(IrOpcode::MovReg, Reg::R0, Reg::R1, ShiftType::Lsr, 4),
        Opcode::MOV,
    );
}

#[test]
fn xval_multiply() {
    verify(create::mul(Reg::R0, Reg::R1, Reg::R2), Opcode::MUL);
    verify(create::mul(Reg::R0, Reg::R0, Reg::R0), Opcode::MUL);
    verify(
        create::mla(IrOpcode::Mla, Reg::R0, Reg::R1, Reg::R2, Reg::R3),
        Opcode::MLA,
    );
}

#[test]
fn xval_misc() {
    verify(create::clz(Reg::R0, Reg::R1), Opcode::CLZ);
    verify(create::bx(Reg::LR), Opcode::BX);
    verify(create::svc(0), Opcode::SVC);
    verify(create::bkpt(0), Opcode::BKPT);
}

// ── Loads and stores ────────────────────────────────────────────────────

#[test]
fn xval_load_store() {
    let cases = [
        (IrOpcode::LdrImm, Opcode::LDR),
        (IrOpcode::StrImm, Opcode::STR),
        (IrOpcode::LdrbImm, Opcode::LDRB),
        (IrOpcode::StrbImm, Opcode::STRB),
        (IrOpcode::LdrhImm, Opcode::LDRH),
        (IrOpcode::StrhImm, Opcode::STRH),
    ];
    for (op, expected) in cases {
        verify(
            create::load_store_imm(op, Reg::R0, Reg::R1, 0, AddrMode::Offset),
            expected,
        );
        verify(
            create::load_store_imm(op, Reg::R0, Reg::R1, 8, AddrMode::Offset),
            expected,
        );
    }
}

#[test]
fn xval_literal_loads() {
    verify(create::load_literal(IrOpcode::LdrLit, Reg::R0, -4), Opcode::LDR);
    verify(create::load_literal(IrOpcode::LdrLit, Reg::R0, 16), Opcode::LDR);
}

#[test]
fn xval_rewritten_literal_load() {
    // The form the rewrite pass produces.
    verify(
        create::load_store_imm(IrOpcode::LdrImm, Reg::R0, Reg::R10, 0, AddrMode::Offset),
        Opcode::LDR,
    );
}

#[test]
fn xval_push_pop() {
    let (opcode, formatted) = encode_and_decode(&create::push(&[Reg::R4, Reg::LR]));
    assert!(
        matches!(opcode, Opcode::PUSH | Opcode::STM(..)),
        "push decoded as `{formatted}`"
    );
    let (opcode, formatted) = encode_and_decode(&create::pop(&[Reg::R4, Reg::PC]));
    assert!(
        matches!(opcode, Opcode::POP | Opcode::LDM(..)),
        "pop decoded as `{formatted}`"
    );
}

// ── Branches ────────────────────────────────────────────────────────────

#[test]
fn xval_branches() {
    verify(create::b(Operand::Pc(0x2000)), Opcode::B);
    verify(create::bl(Operand::Pc(0x0800)), Opcode::BL);
}
