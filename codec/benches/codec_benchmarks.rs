use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use glam::Vec3;

use objgraph_codec::{
    Codec, ConverterRegistry, DatabaseSet, EngineType, Format, LiveRef, ObjectData, ObjectHandle,
    Persistable, RuntimeMode, TypeInfo, decode, encode,
};

// ---------------------------------------------------------------------------
// Helper types
// ---------------------------------------------------------------------------

struct Unit;
impl EngineType for Unit {
    const TYPE_NAME: &'static str = "Unit";
}

#[derive(Default, Persistable)]
#[persist(name = "bench::Soldier")]
struct Soldier {
    #[persist(identity)]
    pub id: Option<ObjectHandle>,
    pub name: String,
    pub health: i32,
    pub position: Vec3,
    #[persist(convert)]
    pub reload: Duration,
    pub follows: LiveRef<Unit>,
}

#[derive(Default, Persistable)]
#[persist(name = "bench::Army")]
struct Army {
    pub soldiers: Vec<String>,
    pub first: Soldier,
    pub second: Soldier,
    pub third: Soldier,
}

fn soldier(id: u64, follows: u64) -> Soldier {
    Soldier {
        id: Some(ObjectHandle::of::<Unit>(id)),
        name: format!("soldier-{id}"),
        health: 100,
        position: Vec3::new(id as f32, 0.0, 1.0),
        reload: Duration::from_millis(750),
        follows: LiveRef::new(follows),
    }
}

// `first` follows a soldier serialized after it, so one reference waits for flush
fn army() -> Army {
    Army {
        soldiers: (0..64).map(|i| format!("reserve-{i}")).collect(),
        first: soldier(1, 3),
        second: soldier(2, 1),
        third: soldier(3, 2),
    }
}

fn running() -> DatabaseSet {
    let mut databases = DatabaseSet::new();
    databases.set_mode(RuntimeMode::Running);
    databases
}

// ---------------------------------------------------------------------------
// Walks
// ---------------------------------------------------------------------------

fn bench_serialize_army(c: &mut Criterion) {
    let codec = Codec::new();
    let army = army();
    c.bench_function("serialize_army", |b| {
        b.iter_batched(
            running,
            |mut databases| black_box(codec.serialize(&army, &mut databases)),
            BatchSize::SmallInput,
        );
    });
}

fn bench_deserialize_army(c: &mut Criterion) {
    let codec = Codec::new();
    let mut databases = running();
    let saved = codec.serialize(&army(), &mut databases).expect("serialize");
    c.bench_function("deserialize_army", |b| {
        b.iter_batched(
            || (running(), army()),
            |(mut databases, mut target)| {
                black_box(codec.deserialize_into(&mut target, &saved.document, &mut databases))
            },
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Converter lookup
// ---------------------------------------------------------------------------

fn bench_converter_lookup_cached(c: &mut Criterion) {
    let registry = ConverterRegistry::discover();
    let duration = TypeInfo::of::<Duration>();
    let string = TypeInfo::of::<String>();
    c.bench_function("converter_lookup_cached", |b| {
        b.iter(|| {
            black_box(registry.find(&duration).is_some());
            black_box(registry.find(&string).is_some());
        });
    });
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

fn bench_formats(c: &mut Criterion) {
    let codec = Codec::new();
    let mut databases = running();
    let document = codec
        .serialize(&army(), &mut databases)
        .expect("serialize")
        .document;

    let formats = [
        #[cfg(feature = "serialize-ron")]
        Format::Ron,
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode,
    ];
    for format in formats {
        let name = format.extension();
        c.bench_function(&format!("encode_army_{name}"), |b| {
            b.iter(|| black_box(encode(&document, format)));
        });

        let bytes = encode(&document, format).expect("encode");
        c.bench_function(&format!("decode_army_{name}"), |b| {
            b.iter(|| black_box(decode::<ObjectData>(&bytes, format)));
        });
    }
}

criterion_group!(
    benches,
    bench_serialize_army,
    bench_deserialize_army,
    bench_converter_lookup_cached,
    bench_formats,
);
criterion_main!(benches);
