#![no_main]

use libfuzzer_sys::fuzz_target;
use pipestreams::{BufferedSource, Error, SliceSource};

// The first bytes choose a buffer size and a sequence of operations; the
// rest is the stream. Whatever the operations do, every unit handed out must
// match the stream at the current logical position.
fuzz_target!(|input: &[u8]| {
    if input.len() < 2 {
        return;
    }
    let capacity = usize::from(input[0] % 32) + 1;
    let ops_len = usize::from(input[1]).min(input.len() - 2);
    let ops = &input[2..2 + ops_len];
    let data = &input[2 + ops_len..];

    let mut source = BufferedSource::with_capacity(capacity, SliceSource::new(data)).unwrap();
    let mut pos = 0;
    let mut marked: Option<usize> = None;
    let mut buf = [0; 64];

    for op in ops {
        let arg = usize::from(op >> 2);
        match op & 3 {
            0 => {
                let outcome = source.read_range(&mut buf, 0, arg.min(buf.len())).unwrap();
                assert_eq!(&buf[..outcome.size], &data[pos..pos + outcome.size]);
                pos += outcome.size;
            }
            1 => {
                let skipped = source.skip(arg).unwrap();
                assert!(skipped <= arg);
                pos += skipped;
            }
            2 => {
                source.mark(arg);
                marked = Some(pos);
            }
            _ => match source.reset() {
                Ok(()) => pos = marked.expect("reset succeeded without a mark"),
                Err(Error::MarkNotSet) => assert!(marked.is_none()),
                Err(Error::MarkInvalidated) => {}
                Err(e) => panic!("unexpected error {}", e),
            },
        }
        assert!(pos <= data.len());
    }
});
