#![no_main]
use libfuzzer_sys::fuzz_target;
use osmclean::xml::{parse, parse_str, serialize, to_bytes};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = parse(data) {
        let _ = parse_str(&serialize(&doc));
        if let Ok(encoded) = to_bytes(&doc) {
            let _ = parse(&encoded);
        }
    }
});
