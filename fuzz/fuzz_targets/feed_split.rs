#![no_main]

use libfuzzer_sys::fuzz_target;
use wirehttp::{Consumer, RequestFramer, Settings};

#[derive(Default)]
struct NullConsumer;

impl Consumer for NullConsumer {}

// Splits the fuzz input into arbitrary-length fragments (driven by the
// first byte of each fragment boundary) and feeds them one at a time, to
// exercise split-invariance: any application of `feed` to the same overall
// byte stream must behave the same regardless of fragmentation.
fuzz_target!(|data: &[u8]| {
    let mut framer = match RequestFramer::new(NullConsumer, Settings::default()) {
        Ok(f) => f,
        Err(_) => return,
    };

    let mut rest = data;
    while !rest.is_empty() {
        let split = (rest[0] as usize % rest.len()).max(1);
        let (head, tail) = rest.split_at(split);
        if framer.feed(head).is_err() {
            return;
        }
        rest = tail;
    }
});
