#![no_main]
use libfuzzer_sys::fuzz_target;

use vgsnd::core::SliceIo;

// Exercises only the container parsers (signature sniffing, header field
// reads) without touching a codec kernel, isolating dispatcher panics from
// render-loop panics caught by `decode_any`.
fuzz_target!(|data: Vec<u8>| {
    let io = SliceIo::new(data);
    let _ = vgsnd::open(Box::new(io));
});
