#![no_main]
use libfuzzer_sys::fuzz_target;

use arm_ir::{decode, decode_word, encode, EncodeContext, InstrList};

fuzz_target!(|data: &[u8]| {
    let mut list = InstrList::new();
    for (i, chunk) in data.chunks_exact(4).enumerate() {
        let pc = 0x1_0000 + 4 * i as u32;
        let Ok((mut instr, _)) = decode(chunk, pc) else {
            continue;
        };
        if instr.decode_operands().is_err() {
            continue;
        }

        // A decoded word must re-encode to something that decodes the same.
        instr.set_raw_bits_valid(false);
        let mut buf = [0u8; 4];
        if encode(&instr, &mut buf, pc).is_ok() {
            let again = decode_word(u32::from_le_bytes(buf), pc)
                .expect("encoded word does not decode");
            assert_eq!(again.opcode(), instr.opcode());
            assert_eq!(again.dsts(), instr.dsts());
            assert_eq!(again.srcs(), instr.srcs());
        }
        list.append(instr);
    }
    let _ = list.encode_to_vec(&mut EncodeContext::default(), 0x2_0000);
});
