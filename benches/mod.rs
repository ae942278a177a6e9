use criterion::{criterion_group, criterion_main};

mod sensor;

criterion_group!(
    benches,
    sensor::frame::bench_encode,
    sensor::frame::bench_decode,
    sensor::frame::bench_send_frame
);
criterion_main!(benches);
