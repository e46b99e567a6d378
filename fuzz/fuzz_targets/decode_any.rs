#![no_main]
use libfuzzer_sys::fuzz_target;

use vgsnd::core::SliceIo;

fuzz_target!(|data: Vec<u8>| {
    let io = SliceIo::new(data);

    let mut stream = match vgsnd::open(Box::new(io)) {
        Ok(stream) => stream,
        Err(_) => return,
    };

    let mut buf = vec![0i16; 4096 * stream.channels as usize];
    for _ in 0..1024 {
        match stream.render(&mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
});
