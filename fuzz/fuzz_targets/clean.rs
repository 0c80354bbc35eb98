#![no_main]
use libfuzzer_sys::fuzz_target;
use osmclean::{clean_str, Preset};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for preset in [Preset::Fixme, Preset::Name] {
            if let Ok(rule) = preset.rule() {
                let _ = clean_str(s, &rule);
            }
        }
    }
});
