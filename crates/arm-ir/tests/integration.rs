//! End-to-end tests through the public API: building, laying out, decoding,
//! relocating and rewriting instruction lists.

use arm_ir::encode::instr_is_encoding_possible;
use arm_ir::{
    create, decode, decode_word, encode, encode_to_copy, AddrMode, Cond, EncodeContext,
    EncodeOptions, InstrFlags, InstrList, Instruction, IrError, IsaMode, Opcode, Operand, Reg,
    RewriteOptions,
};

fn word(instr: &Instruction, pc: u32) -> u32 {
    let mut buf = [0u8; 4];
    assert_eq!(encode(instr, &mut buf, pc).unwrap(), 4);
    u32::from_le_bytes(buf)
}

fn words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn bytes_of(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Decode a whole buffer of A32 code into a list.
fn decode_all(code: &[u8], pc: u32) -> InstrList {
    let mut list = InstrList::new();
    let mut offset = 0;
    while offset < code.len() {
        let (instr, len) = decode(&code[offset..], pc + offset as u32).unwrap();
        list.append(instr);
        offset += len;
    }
    list
}

// ── Encoding ─────────────────────────────────────────────────────────────

#[test]
fn register_fields_are_zero_based() {
    let add = create::dp_reg(Opcode::AddReg, Reg::R2, Reg::R2, Reg::R3);
    let mut buf = [0u8; 4];
    encode(&add, &mut buf, 0).unwrap();
    assert_eq!(buf, [0x03, 0x20, 0x82, 0xE0]);
    assert_eq!(Reg::R2 as u8, 3);
}

#[test]
fn unconditional_opcodes_ignore_the_condition() {
    let dmb = create::dmb(0xB).with_cond(Cond::Ne);
    assert_eq!(word(&dmb, 0) >> 28, 0xF);
    assert_eq!(word(&dmb, 0), 0xF57F_F05B);
    let svc = create::svc(0).with_cond(Cond::Ne);
    assert_eq!(word(&svc, 0) >> 28, Cond::Ne as u32);
}

#[test]
fn multiply_keeps_its_secondary_opcode() {
    // mul r0, r0, r0 must not lose bits 7..4 and turn into an `and`.
    let mul = create::mul(Reg::R0, Reg::R0, Reg::R0);
    assert_eq!(word(&mul, 0), 0xE000_0090);
    assert_eq!(decode_word(0xE000_0090, 0).unwrap().opcode(), Opcode::Mul);
}

#[test]
fn encoding_possible_matches_encode() {
    let good = create::dp_imm(Opcode::AddImm, Reg::R0, Reg::R1, 0x3FC);
    assert!(instr_is_encoding_possible(&good));
    // 0x101 is not an 8-bit value under any even rotation.
    let bad = create::dp_imm(Opcode::AddImm, Reg::R0, Reg::R1, 0x101);
    assert!(!instr_is_encoding_possible(&bad));
    let mut buf = [0u8; 4];
    assert_eq!(
        encode(&bad, &mut buf, 0),
        Err(IrError::NoEncoding {
            opcode: Opcode::AddImm
        })
    );
}

#[test]
fn thumb_has_no_encoder() {
    let mut ctx = EncodeContext::new(EncodeOptions::default().isa(IsaMode::Thumb));
    let mut buf = [0u8; 4];
    let err = arm_ir::encode_to_copy(&mut ctx, &create::nop(), None, &mut buf, 0).unwrap_err();
    assert_eq!(err, IrError::UnsupportedIsa { isa: IsaMode::Thumb });
    assert_eq!(err.to_string(), "no encoder registered for thumb");
}

#[test]
fn encoded_words_decode_back() {
    let cases = [
        create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2),
        create::dp_reg(Opcode::SubReg, Reg::R3, Reg::R4, Reg::R5).with_flags(InstrFlags::S),
        create::dp_move_imm(Opcode::MovImm, Reg::R0, 0xFF00_0000),
        create::mul(Reg::R0, Reg::R1, Reg::R2),
        create::push(&[Reg::R4, Reg::LR]),
        create::pop(&[Reg::R4, Reg::PC]),
        create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 4, AddrMode::Offset),
        create::load_store_imm(Opcode::StrImm, Reg::R0, Reg::SP, -8, AddrMode::PreIndex),
        create::load_literal(Opcode::LdrLit, Reg::R0, -4),
        create::extend(Opcode::Sxtb, Reg::R0, Reg::R1, 0),
        create::bfc(Reg::R0, 0, 16),
        create::ldc(14, Reg::Cr5, Reg::R0, 8, AddrMode::Offset),
        create::mrc(15, 0, Reg::R0, Reg::Cr13, Reg::Cr0, 3),
        create::vldr(Reg::D0, Reg::R0, 8),
        create::vmov_sr(Reg::S1, Reg::R0),
        create::vfp_arith(Opcode::VaddS, Reg::S0, Reg::S1, Reg::S2),
        create::svc(0x90_0001).with_cond(Cond::Ne),
        create::bl(Operand::Pc(0x1000)),
    ];
    for instr in cases {
        let w = word(&instr, 0);
        let mut decoded = decode_word(w, 0).unwrap();
        assert_eq!(decoded.opcode(), instr.opcode(), "{:#010x}", w);
        decoded.set_raw_bits_valid(false);
        assert_eq!(word(&decoded, 0), w, "{}", instr);
    }
}

// ── Lists ────────────────────────────────────────────────────────────────

#[test]
fn branches_to_labels() {
    let mut list = InstrList::new();
    let top = list.append(create::label());
    list.append(create::nop());
    let end = list.append(create::label());
    list.insert_after(top, create::b(Operand::Instr(end)));
    list.append(create::b(Operand::Instr(top)));
    let bytes = list
        .encode_to_vec(&mut EncodeContext::default(), 0x4000)
        .unwrap();
    assert_eq!(
        words(&bytes),
        [
            0xEA00_0000, // b end (pc + 8)
            0xE320_F000, // nop
            0xEAFF_FFFC, // b top (16 back from pc + 8)
        ]
    );
}

#[test]
fn literal_pool_after_code() {
    let mut list = InstrList::new();
    list.append(create::nop());
    list.append(create::nop());
    let pool = list.append(create::label());
    list.prepend(create::load_literal_at(Opcode::LdrLit, Reg::R0, pool, 0));
    let bytes = list.encode_to_vec(&mut EncodeContext::default(), 0).unwrap();
    assert_eq!(words(&bytes)[0], 0xE59F_0004);
}

#[test]
fn dangling_reference() {
    let mut list = InstrList::new();
    let gone = list.append(create::nop());
    list.append(create::b(Operand::Instr(gone)));
    list.remove(gone);
    let err = list
        .encode_to_vec(&mut EncodeContext::default(), 0)
        .unwrap_err();
    assert_eq!(err, IrError::UnresolvedTarget { target: gone });
}

#[test]
fn size_bound_is_checked_before_encoding() {
    let mut list: InstrList = [create::nop(), create::nop()].into_iter().collect();
    let mut buf = [0u8; 16];
    let err = list
        .encode_to_copy(&mut EncodeContext::default(), &mut buf, 0, Some(4))
        .unwrap_err();
    assert_eq!(err, IrError::ExceedsMaxLength { length: 8, max: 4 });
    let mut small = [0u8; 4];
    let err = list
        .encode_to_copy(&mut EncodeContext::default(), &mut small, 0, None)
        .unwrap_err();
    assert_eq!(
        err,
        IrError::BufferTooSmall {
            needed: 8,
            available: 4
        }
    );
}

#[test]
fn first_failure_aborts_the_batch() {
    let mut list = InstrList::new();
    list.append(create::nop());
    list.append(create::b(Operand::Pc(0x1002)));
    list.append(create::nop());
    let err = list
        .encode_to_vec(&mut EncodeContext::default(), 0)
        .unwrap_err();
    assert!(matches!(err, IrError::InvalidOperand { opcode: Opcode::B, .. }));
}

// ── Copying decoded code ─────────────────────────────────────────────────

#[test]
fn unmodified_code_is_copied_verbatim() {
    let code = bytes_of(&[
        0xE92D_4010, // push {r4, lr}
        0xE081_0002, // add r0, r1, r2
        0xE8BD_8010, // pop {r4, pc}
    ]);
    let mut list = decode_all(&code, 0x1000);
    let mut ctx = EncodeContext::default();
    assert_eq!(list.encode_to_vec(&mut ctx, 0x1000).unwrap(), code);
    assert_eq!(ctx.stats().copied, 3);
    assert_eq!(ctx.stats().encoded, 0);
}

#[test]
fn modified_instructions_are_reencoded() {
    let code = bytes_of(&[0xE92D_4010, 0xE081_0002, 0xE8BD_8010]);
    let mut list = decode_all(&code, 0);
    let add = list.ids()[1];
    assert!(list.get_mut(add).unwrap().replace_reg(Reg::R1, Reg::R3));
    let mut ctx = EncodeContext::default();
    let out = list.encode_to_vec(&mut ctx, 0).unwrap();
    assert_eq!(words(&out), [0xE92D_4010, 0xE083_0002, 0xE8BD_8010]);
    assert_eq!(ctx.stats().encoded, 1);
    assert_eq!(ctx.stats().copied, 2);
}

#[test]
fn copied_branch_keeps_its_target() {
    // bl at 0x100 calls 0x1100.
    let bl = Instruction::from_raw(&0xEB00_03FE_u32.to_le_bytes(), 0x100);
    assert_eq!(word(&bl, 0x100), 0xEB00_03FE);
    assert_eq!(word(&bl, 0x200), 0xEB00_03BE);
}

#[test]
fn copied_literal_keeps_its_address() {
    // ldr r0, [pc, #-4] at 0x1000 reads 0x1004.
    let ldr = Instruction::from_raw(&0xE51F_0004_u32.to_le_bytes(), 0x1000);
    assert_eq!(word(&ldr, 0x1010), 0xE51F_0014);
    assert_eq!(word(&ldr, 0x0FF0), 0xE59F_000C);
}

#[test]
fn copied_halfword_and_dual_literals_keep_their_address() {
    // ldrh r0, [pc, #8] at 0x1000 reads 0x1010.
    let ldrh = Instruction::from_raw(&0xE1DF_00B8_u32.to_le_bytes(), 0x1000);
    assert_eq!(word(&ldrh, 0x1020), 0xE15F_01B8);
    let moved = decode_word(0xE15F_01B8, 0x1020).unwrap();
    assert_eq!(moved.opcode(), Opcode::LdrhLit);
    assert_eq!(moved.src(0).disp(), -0x18);

    // ldrd r2, r3, [pc, #16] at 0x4000 reads 0x4018.
    let ldrd = Instruction::from_raw(&0xE1CF_21D0_u32.to_le_bytes(), 0x4000);
    assert_eq!(word(&ldrd, 0x3FF0), 0xE1CF_22D0);
    let mut buf = [0u8; 4];
    let err = encode_to_copy(&mut EncodeContext::default(), &ldrd, None, &mut buf, 0x3F00);
    assert!(matches!(
        err,
        Err(IrError::TargetUnreachable {
            opcode: Opcode::LdrdLit,
            ..
        })
    ));
}

#[test]
fn copied_adr_keeps_its_address() {
    // adr r0, #16 at 0x2000 computes 0x2018; from 0x3000 that is pc - 0xff0.
    let adr = Instruction::from_raw(&0xE28F_0010_u32.to_le_bytes(), 0x2000);
    let mut ctx = EncodeContext::default();
    let mut buf = [0u8; 4];
    encode_to_copy(&mut ctx, &adr, None, &mut buf, 0x3000).unwrap();
    assert_eq!(u32::from_le_bytes(buf), 0xE24F_0EFF);
    assert_eq!(ctx.stats().retargeted, 1);

    // and the subtracting form moves back to an add
    let sub = Instruction::from_raw(&0xE24F_0EFF_u32.to_le_bytes(), 0x3000);
    assert_eq!(word(&sub, 0x2000), 0xE28F_0010);

    // 0x1010 is not a rotated immediate
    assert!(matches!(
        encode_to_copy(&mut ctx, &adr, None, &mut buf, 0x1000),
        Err(IrError::TargetUnreachable {
            opcode: Opcode::Adr,
            ..
        })
    ));
}

#[test]
fn copied_branch_out_of_range() {
    let b = Instruction::from_raw(&0xEA00_0000_u32.to_le_bytes(), 0);
    let mut buf = [0u8; 4];
    let err = encode(&b, &mut buf, 0x0400_0000).unwrap_err();
    assert!(matches!(err, IrError::TargetUnreachable { opcode: Opcode::B, .. }));
}

// ── Rewriting ────────────────────────────────────────────────────────────

#[test]
fn relocated_function_with_a_literal() {
    let _ = env_logger::builder().is_test(true).try_init();
    let code = bytes_of(&[
        0xE59F_0004, // ldr r0, [pc, #4]  (reads 0x100C)
        0xE12F_FF1E, // bx lr
    ]);
    let mut list = decode_all(&code, 0x1000);
    let stats = list
        .rewrite_relative_to_absolute(&RewriteOptions::default())
        .unwrap();
    assert_eq!(stats.literal_loads, 1);
    assert_eq!(stats.inserted, 6);

    let out = list
        .encode_to_vec(&mut EncodeContext::default(), 0x9000)
        .unwrap();
    assert_eq!(
        words(&out),
        [
            0xE92D_0C00, // push {r10, r11}
            0xE3A0_A000, // mov r10, #0
            0xE38A_A000, // orr r10, r10, #0
            0xE38A_AA01, // orr r10, r10, #0x1000
            0xE38A_A00C, // orr r10, r10, #0xc
            0xE59A_0000, // ldr r0, [r10]
            0xE8BD_0C00, // pop {r10, r11}
            0xE12F_FF1E, // bx lr
        ]
    );
    assert!(list.iter().take(7).all(Instruction::our_mangling));
    assert!(!list.last().unwrap().our_mangling());
}

#[test]
fn rewrite_with_custom_scratch() {
    let code = bytes_of(&[0xE59F_0000]); // ldr r0, [pc]
    let mut list = decode_all(&code, 0);
    let options = RewriteOptions::default().scratch(Reg::R4, Reg::R5);
    list.rewrite_relative_to_absolute(&options).unwrap();
    let out = words(&list.encode_to_vec(&mut EncodeContext::default(), 0).unwrap());
    assert_eq!(out[0], 0xE92D_0030); // push {r4, r5}
    assert_eq!(out[5], 0xE594_0000); // ldr r0, [r4]
    assert_eq!(out[6], 0xE8BD_0030);
}

#[test]
fn rewrite_is_idempotent() {
    let _ = env_logger::builder().is_test(true).try_init();
    let code = bytes_of(&[0xE59F_0000, 0xE28F_0010]);
    let mut list = decode_all(&code, 0x2000);
    let first = list
        .rewrite_relative_to_absolute(&RewriteOptions::default())
        .unwrap();
    assert_eq!(first.rewritten(), 2);
    let second = list
        .rewrite_relative_to_absolute(&RewriteOptions::default())
        .unwrap();
    assert_eq!(second.rewritten(), 0);
    assert_eq!(second.inserted, 0);
}
