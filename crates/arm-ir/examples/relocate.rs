//! Relocation example: decode a function, move it, and make its
//! PC-relative reads position independent.
//!
//! Run with: `cargo run --example relocate`
//! Set `RUST_LOG=debug` to see what the rewrite pass does.

use arm_ir::{decode, EncodeContext, InstrList, Instruction, RewriteOptions};

/// A small function at 0x8000 followed by its literal pool.
const FUNCTION: &[u32] = &[
    0xE92D_4010, // push {r4, lr}
    0xE59F_0004, // ldr r0, [pc, #4]      ; loads the pool word at 0x8010
    0xEB00_0001, // bl 0x8014
    0xE8BD_8010, // pop {r4, pc}
    0x0000_002A, // .word 42
    0xE12F_FF1E, // bx lr
];

const ORIGIN: u32 = 0x8000;

fn main() {
    env_logger::init();
    println!("=== arm_ir relocation example ===\n");

    let bytes: Vec<u8> = FUNCTION.iter().flat_map(|w| w.to_le_bytes()).collect();

    // --- Decode ---
    println!("1. Decoded at {:#x}:", ORIGIN);
    let mut list = decode_function(&bytes, ORIGIN);
    for line in list.to_string().lines() {
        println!("   {}", line);
    }

    // --- Unchanged copy ---
    println!("\n2. Copied back to its own address (raw bits are reused):");
    let mut ctx = EncodeContext::default();
    let same = list.encode_to_vec(&mut ctx, ORIGIN).unwrap();
    print_words("   ", &same);
    assert_eq!(same, bytes);
    println!("   {:?}", ctx.stats());

    // --- Moved copy ---
    println!("\n3. Copied to 0x9000 (branch and literal offsets re-aimed):");
    let mut ctx = EncodeContext::default();
    let moved = list.encode_to_vec(&mut ctx, 0x9000).unwrap();
    print_words("   ", &moved);
    println!("   {:?}", ctx.stats());

    // --- Rewrite ---
    println!("\n4. PC-relative reads rewritten to absolute addresses:");
    let stats = list
        .rewrite_relative_to_absolute(&RewriteOptions::default())
        .unwrap();
    for line in list.to_string().lines() {
        println!("   {}", line);
    }
    println!("   {:?}", stats);

    // --- Far copy ---
    println!("\n5. Rewritten code copied to 0x0010_0000:");
    let mut ctx = EncodeContext::default();
    let far = list.encode_to_vec(&mut ctx, 0x0010_0000).unwrap();
    print_words("   ", &far);
    println!("   {:?}", ctx.stats());

    println!("\n=== Done ===");
}

/// Decode `bytes` word by word; words that are not instructions are kept
/// as raw data.
fn decode_function(bytes: &[u8], pc: u32) -> InstrList {
    bytes
        .chunks(4)
        .enumerate()
        .map(|(i, chunk)| {
            let at = pc + 4 * i as u32;
            match decode(chunk, at) {
                Ok((instr, _)) => instr,
                Err(_) => Instruction::from_raw(chunk, at),
            }
        })
        .collect()
}

fn print_words(prefix: &str, bytes: &[u8]) {
    for chunk in bytes.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        println!("{}{:08X}", prefix, u32::from_le_bytes(word));
    }
}
