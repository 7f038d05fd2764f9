//! Record marshaling benchmarks
//!
//! Measures script object → record extraction and record → host struct
//! conversion for the record kinds streamed in bulk.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pyo3::prelude::*;
use pvr_python::abi::convert::OwnedEpgTag;
use pvr_python::abi::types::{PvrChannel, PvrTimer};
use pvr_python::interpreter::coerce::{extract_record, record_to_dict};
use pvr_python::{Channel, EpgTag, Timer};

fn sample_channel(i: usize) -> Channel {
    Channel {
        unique_id: i as i64,
        channel_number: i as i64,
        channel_name: format!("Channel {}", i),
        stream_url: format!("http://example.invalid/live/{}.m3u8", i),
        icon_path: format!("http://example.invalid/logo/{}.png", i),
        ..Channel::default()
    }
}

fn sample_epg(i: usize) -> EpgTag {
    EpgTag {
        unique_broadcast_id: i as i64,
        title: format!("Programme {}", i),
        start_time: 1_476_000_000 + i as i64 * 1800,
        end_time: 1_476_001_800 + i as i64 * 1800,
        plot: "A long plot outline that is copied for every tag ".repeat(4),
        genre_description: "Factual".into(),
        ..EpgTag::default()
    }
}

fn bench_host_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_conversion");

    let channel = sample_channel(7);
    group.bench_function("channel", |b| {
        b.iter(|| black_box(PvrChannel::from(black_box(&channel))))
    });

    let timer = Timer {
        title: "Evening news".into(),
        summary: "Recorded weekly".into(),
        ..Timer::default()
    };
    group.bench_function("timer", |b| {
        b.iter(|| black_box(PvrTimer::from(black_box(&timer))))
    });

    let tag = sample_epg(3);
    group.bench_function("epg_tag", |b| {
        b.iter(|| black_box(OwnedEpgTag::from(black_box(&tag))))
    });

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    pyo3::prepare_freethreaded_python();
    let mut group = c.benchmark_group("extraction");

    for size in [10usize, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("epg_tags", size), size, |b, &size| {
            Python::with_gil(|py| {
                let dicts: Vec<_> = (0..size)
                    .map(|i| record_to_dict(py, &sample_epg(i)).unwrap())
                    .collect();
                b.iter(|| {
                    for dict in &dicts {
                        black_box(extract_record::<EpgTag>(dict).unwrap());
                    }
                })
            })
        });

        group.bench_with_input(BenchmarkId::new("channels", size), size, |b, &size| {
            Python::with_gil(|py| {
                let dicts: Vec<_> = (0..size)
                    .map(|i| record_to_dict(py, &sample_channel(i)).unwrap())
                    .collect();
                b.iter(|| {
                    for dict in &dicts {
                        black_box(extract_record::<Channel>(dict).unwrap());
                    }
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_host_conversion, bench_extraction);
criterion_main!(benches);
