use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

fn bench_parse_message(c: &mut Criterion) {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("20230101-120000.msg");

    c.bench_function("parse_fixture_file", |b| {
        b.iter(|| smolmsg::store::reader::parse_file(&fixture_path).unwrap())
    });

    // One large attachment, skipped rather than copied
    let mut data = b"subject big\ntime 2022-08-08 11:09:03\nfile 1048576 blob\n".to_vec();
    data.extend(std::iter::repeat_n(0xa5u8, 1 << 20));
    c.bench_function("parse_1mb_attachment", |b| {
        b.iter(|| smolmsg::parser::parse(&data[..], data.len() as u64, "bench").unwrap())
    });
}

fn bench_encode_id(c: &mut Criterion) {
    let id = smolmsg::id::MessageId::from_bytes([0xc3; 24]);
    c.bench_function("encode_id_base62", |b| b.iter(|| id.to_base62()));

    let text = id.to_base62();
    c.bench_function("decode_id_base62", |b| {
        b.iter(|| text.parse::<smolmsg::id::MessageId>().unwrap())
    });
}

criterion_group!(benches, bench_parse_message, bench_encode_id);
criterion_main!(benches);
