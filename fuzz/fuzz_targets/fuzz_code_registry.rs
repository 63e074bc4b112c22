//! Fuzz target: 433 MHz code tables
//!
//! Parses arbitrary text as both rx and tx code tables, checking:
//! - No panics under any input
//! - A parsed registry holds exactly one entry per object key
//! - Every parsed rx code can be looked up again
//!
//! cargo fuzz run fuzz_code_registry

#![no_main]

use boilerbridge::radio::{CodeRegistry, RxCode, RxDecoder, TxCode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(rx) = CodeRegistry::<RxCode>::from_json(json) {
        for (_, code) in rx.iter() {
            assert!(rx.lookup(code.code, code.length).is_some());
        }
        let mut decoder = RxDecoder::new(rx.clone());
        for (i, (_, code)) in rx.iter().enumerate() {
            let _ = decoder.on_code(i as u32, code.code, code.length);
        }
    }

    if let Ok(tx) = CodeRegistry::<TxCode>::from_json(json) {
        assert!(tx.iter().all(|(path, _)| tx.get(path).is_some()));
    }
});
