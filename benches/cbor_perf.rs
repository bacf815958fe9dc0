use codspeed_criterion_compat::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use tagwire_cbor::{Codec, Value, from_slice, to_vec};

#[derive(Serialize, Deserialize)]
struct Record {
    id: u64,
    name: String,
    scores: Vec<f64>,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
}

fn document(entries: usize) -> Value {
    Value::Array(
        (0..entries)
            .map(|i| {
                Value::Map(vec![
                    (Value::from("id"), Value::from(i)),
                    (Value::from("name"), Value::from(format!("entry-{i}"))),
                    (Value::from("ok"), Value::Bool(i % 2 == 0)),
                ])
            })
            .collect(),
    )
}

fn bench_byte_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_strings");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let data = ByteBuf::from(vec![0xa5u8; size]);
        let encoded = to_vec(&data).unwrap();
        group.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| to_vec(black_box(data)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, bytes| {
            b.iter(|| from_slice::<ByteBuf>(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_value_tree(c: &mut Criterion) {
    let codec = Codec::new();
    let value = document(1000);
    let encoded = codec.encode(&value).unwrap();

    c.bench_function("value_encode_1000", |b| {
        b.iter(|| codec.encode(black_box(&value)).unwrap())
    });
    c.bench_function("value_decode_1000", |b| {
        b.iter(|| codec.decode(black_box(&encoded)).unwrap())
    });
}

fn bench_serde_struct(c: &mut Criterion) {
    let record = Record {
        id: 42,
        name: "sensor".to_string(),
        scores: vec![0.5; 64],
        payload: vec![7; 512],
    };
    let encoded = to_vec(&record).unwrap();

    c.bench_function("struct_encode", |b| b.iter(|| to_vec(black_box(&record)).unwrap()));
    c.bench_function("struct_decode", |b| {
        b.iter(|| from_slice::<Record>(black_box(&encoded)).unwrap())
    });
}

criterion_group!(benches, bench_byte_strings, bench_value_tree, bench_serde_struct);
criterion_main!(benches);
