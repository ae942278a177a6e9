use criterion::{BenchmarkId, Criterion, Throughput};
use rand::Rng;
use sensorlink::sensor::frame::{self, FUN_CODE_UPLOAD_DATA, MAX_PAYLOAD_LEN};
use sensorlink::transport::Write;
use std::hint::black_box;

const PAYLOAD_SIZES: [usize; 3] = [3, 32, MAX_PAYLOAD_LEN];

/// Serial port that discards everything.
struct NullSerial;

impl Write for NullSerial {
    type Error = ();

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    rand::thread_rng().fill(&mut payload[..]);
    payload
}

pub fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");
    for size in PAYLOAD_SIZES {
        let payload = random_payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| frame::encode(FUN_CODE_UPLOAD_DATA, black_box(payload)).unwrap());
        });
    }
    group.finish();
}

pub fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");
    for size in PAYLOAD_SIZES {
        let bytes = frame::encode(FUN_CODE_UPLOAD_DATA, &random_payload(size)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| frame::decode(black_box(bytes)).unwrap());
        });
    }
    group.finish();
}

pub fn bench_send_frame(c: &mut Criterion) {
    let reading = [1u8, 25, 60];
    let mut serial = NullSerial;
    c.bench_function("send_frame_reading", |b| {
        b.iter(|| frame::send_frame(&mut serial, FUN_CODE_UPLOAD_DATA, black_box(&reading)));
    });
}
