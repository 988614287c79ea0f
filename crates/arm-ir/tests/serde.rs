//! Serde round-trip tests for `arm_ir` data types.

#![cfg(feature = "serde")]

use arm_ir::{
    create, decode_word, AddrMode, BaseDisp, Cond, EncodeContext, EncodeOptions, InstrFlags,
    InstrList, IrError, IsaMode, Opcode, Operand, OpndSize, Reg, RewriteOptions, RewriteStats,
    ShiftType,
};

/// Helper: serialize to JSON, deserialize back, assert equality.
fn round_trip<T>(val: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + core::fmt::Debug,
{
    let json = serde_json::to_string(val).expect("serialize");
    let back: T = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(val, &back, "round-trip mismatch for JSON: {json}");
}

#[test]
fn serde_registers() {
    for reg in Reg::ALL {
        round_trip(reg);
    }
}

#[test]
fn serde_opcodes() {
    for op in Opcode::KNOWN {
        round_trip(op);
    }
}

#[test]
fn serde_instruction_attributes() {
    for cond in Cond::ALL {
        round_trip(&cond);
    }
    for shift in [ShiftType::Lsl, ShiftType::Lsr, ShiftType::Asr, ShiftType::Ror] {
        round_trip(&shift);
    }
    round_trip(&(InstrFlags::P | InstrFlags::U | InstrFlags::W));
    round_trip(&AddrMode::PostIndex);
    round_trip(&OpndSize::RotImm12);
}

#[test]
fn serde_operands() {
    round_trip(&Operand::Null);
    round_trip(&Operand::reg(Reg::D17));
    round_trip(&Operand::reg_list(&[Reg::R4, Reg::LR]));
    round_trip(&Operand::immed(-4, OpndSize::Bits32));
    round_trip(&Operand::BaseDisp(BaseDisp::indexed(
        Reg::R1,
        Reg::R2,
        4,
        true,
        OpndSize::Bytes4,
    )));
    round_trip(&Operand::Pc(0x8000));
    round_trip(&Operand::Mask(0b1100));
}

#[test]
fn serde_instructions() {
    round_trip(&create::load_store_imm(
        Opcode::StrImm,
        Reg::R0,
        Reg::SP,
        -8,
        AddrMode::PreIndex,
    ));
    round_trip(&decode_word(0xE92D_4010, 0x1000).unwrap());
}

#[test]
fn serde_list_keeps_references() {
    let mut list = InstrList::new();
    let label = list.append(create::label());
    list.append(create::b(Operand::Instr(label)));
    let json = serde_json::to_string(&list).unwrap();
    let mut back: InstrList = serde_json::from_str(&json).unwrap();
    assert_eq!(back.ids(), list.ids());
    let bytes = back.encode_to_vec(&mut EncodeContext::default(), 0).unwrap();
    assert_eq!(bytes, 0xEAFF_FFFE_u32.to_le_bytes());
}

#[test]
fn serde_options_and_stats() {
    round_trip(&EncodeOptions::default().check_reachable(false).isa(IsaMode::Thumb));
    round_trip(&RewriteOptions::default().scratch(Reg::R4, Reg::R5));
    round_trip(&RewriteStats {
        literal_loads: 1,
        inserted: 6,
        ..RewriteStats::default()
    });
}

#[test]
fn serde_errors() {
    round_trip(&IrError::NoEncoding {
        opcode: Opcode::AddImm,
    });
    round_trip(&IrError::InvalidOperand {
        opcode: Opcode::LdrdImm,
        detail: "first register r1 must be even and not lr".into(),
    });
    round_trip(&IrError::UnsupportedIsa {
        isa: IsaMode::Thumb,
    });
}
