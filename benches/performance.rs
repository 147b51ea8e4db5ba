use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stridebuf::{Element, StrideBuf, StrideIter};

fn filled(size: usize) -> StrideBuf {
    let values: Vec<u64> = (0..size as u64).collect();
    StrideBuf::from_values(&values).unwrap()
}

fn bench_sequential_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_push");

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("u64", size), size, |b, &size| {
            b.iter(|| {
                let mut buf = StrideBuf::new(8);
                for i in 0..size as u64 {
                    buf.push_value(i).unwrap();
                }
                black_box(buf.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("64_byte_records", size), size, |b, &size| {
            let record = [7u8; 64];
            b.iter(|| {
                let mut buf = StrideBuf::new(64);
                for _ in 0..size {
                    buf.push(black_box(&record)).unwrap();
                }
                black_box(buf.len())
            });
        });
    }
    group.finish();
}

fn bench_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("contiguous", size), size, |b, &size| {
            let source = filled(size);
            b.iter(|| black_box(source.iter().collect_create().unwrap().len()));
        });
        group.bench_with_input(BenchmarkId::new("generator", size), size, |b, &size| {
            b.iter(|| {
                let iter = StrideIter::from_values(0..size as u64);
                black_box(iter.collect_create().unwrap().len())
            });
        });
    }
    group.finish();
}

fn bench_map_and_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_reduce");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        let source = filled(*size);
        group.bench_with_input(BenchmarkId::new("map_known_size", size), size, |b, _| {
            let mut target = StrideBuf::new(8);
            b.iter(|| {
                source
                    .iter()
                    .map_into(&mut target, |e, slot| {
                        let v = e.read::<u64>().unwrap_or(0).wrapping_mul(3);
                        slot.copy_from_slice(&v.to_ne_bytes());
                    })
                    .unwrap();
                black_box(target.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("reduce_sum", size), size, |b, _| {
            b.iter(|| {
                let mut sum = 0u64;
                source
                    .iter()
                    .reduce_into(&mut sum, |e, acc| *acc += e.read::<u64>().unwrap_or(0));
                black_box(sum)
            });
        });
    }
    group.finish();
}

fn bench_zip_and_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("zip_search");

    for size in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        let left = filled(*size);
        let right = filled(*size);
        group.bench_with_input(BenchmarkId::new("zip_collect", size), size, |b, _| {
            b.iter(|| {
                let zipped = left.iter().zipped(right.iter());
                black_box(zipped.collect_create().unwrap().len())
            });
        });
        group.bench_with_input(BenchmarkId::new("max_element", size), size, |b, _| {
            b.iter(|| {
                let max = left.iter().max_element(|a: &Element<'_>, b: &Element<'_>| {
                    a.read::<u64>().cmp(&b.read::<u64>())
                });
                black_box(max)
            });
        });
        group.bench_with_input(BenchmarkId::new("index_of_last", size), size, |b, &size| {
            let last = size as u64 - 1;
            b.iter(|| black_box(left.iter().index_of_first(|e| e.read::<u64>() == Some(last))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_push,
    bench_collect,
    bench_map_and_reduce,
    bench_zip_and_search
);
criterion_main!(benches);
