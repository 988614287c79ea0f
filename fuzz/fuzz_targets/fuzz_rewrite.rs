#![no_main]
use libfuzzer_sys::fuzz_target;

use arm_ir::{decode, EncodeContext, InstrList, Instruction, RewriteOptions};

fuzz_target!(|data: &[u8]| {
    let mut list: InstrList = data
        .chunks_exact(4)
        .enumerate()
        .map(|(i, chunk)| {
            let pc = 0x8000 + 4 * i as u32;
            match decode(chunk, pc) {
                Ok((instr, _)) => instr,
                Err(_) => Instruction::from_raw(chunk, pc),
            }
        })
        .collect();

    if list.rewrite_relative_to_absolute(&RewriteOptions::default()).is_err() {
        return;
    }
    // A second pass finds nothing left to do.
    let again = list
        .rewrite_relative_to_absolute(&RewriteOptions::default())
        .expect("second rewrite failed");
    assert_eq!(again.rewritten(), 0);

    let _ = list.encode_to_vec(&mut EncodeContext::default(), 0x0100_0000);
});
