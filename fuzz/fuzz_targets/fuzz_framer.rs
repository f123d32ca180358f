#![no_main]

use libfuzzer_sys::fuzz_target;
use ppsmon::pps::decode::DecodeTable;
use ppsmon::pps::frame::Framer;
use ppsmon::pps::source::ByteEvent;
use ppsmon::pps::telegram::validate;

fuzz_target!(|data: &[u8]| {
    // A zero byte followed by 0xFF stands for an idle gap
    let mut framer = Framer::new();
    let mut bytes = data.iter().peekable();
    while let Some(b) = bytes.next() {
        let event = if *b == 0x00 && bytes.peek() == Some(&&0xFF) {
            bytes.next();
            ByteEvent::Gap
        } else {
            ByteEvent::Byte(*b)
        };
        if let Some(raw) = framer.push(event) {
            assert!(raw.bytes.len() <= 9);
            let telegram = validate(raw);
            let _ = telegram.describe();
            if telegram.verdict.needs_resync() {
                framer.resync_after(telegram.bytes());
            }
            let _ = DecodeTable::standard().classify(&telegram);
        }
    }
    framer.push(ByteEvent::End);
});
