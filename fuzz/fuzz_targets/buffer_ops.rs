#![no_main]

use jsonpool::GrowableBuffer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, u16, Vec<String>)| {
    let (capacity, threshold, pieces) = input;
    let mut buf = GrowableBuffer::with_stream_threshold(capacity as usize, threshold as usize);
    let mut expected = String::new();

    for piece in &pieces {
        buf.append(piece);
        expected.push_str(piece);
    }

    // Verify: content is preserved across any promotion
    assert_eq!(buf.len(), expected.len());
    assert_eq!(buf.finalize(), expected);
    assert_eq!(buf.finalize(), buf.finalize());
    assert!(buf.capacity() >= buf.len());

    // Verify: reset returns to the construction state
    let nominal = buf.nominal_capacity();
    buf.reset();
    assert!(buf.is_empty());
    assert_eq!(buf.capacity(), nominal);
    assert_eq!(buf.finalize(), "");
});
