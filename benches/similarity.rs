use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lipidann::feature::{Feature, IonMode, Spectrum};
use lipidann::reference::{InMemoryReferenceStore, ReferenceEntry};
use lipidann::search::{DatabaseSearch, SearchParams};
use lipidann::similarity::{similarity, SimilarityMethod};
use std::collections::BTreeMap;

/// Deterministic spectrum with `peaks` peaks and a per-spectrum m/z shift
fn spectrum(peaks: usize, shift: f64) -> Spectrum {
    Spectrum::new((0..peaks).map(|j| {
        let mz = 100.0 + j as f64 * 7.3 + shift;
        let intensity = 10.0 + ((j * 37) % 101) as f64;
        (mz, intensity)
    }))
    .unwrap()
}

/// Benchmark every similarity method on spectra of growing size
fn bench_similarity_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    for peaks in [20, 100, 500] {
        let query = spectrum(peaks, 0.0);
        let reference = spectrum(peaks, 0.004);
        group.throughput(Throughput::Elements(peaks as u64));

        for method in SimilarityMethod::ALL {
            group.bench_with_input(
                BenchmarkId::new(method.as_str(), peaks),
                &(&query, &reference),
                |b, (query, reference)| {
                    b.iter(|| similarity(black_box(query), black_box(reference), 0.02, method))
                },
            );
        }
    }

    group.finish();
}

/// Benchmark library search against a store of isobaric-dense entries
fn bench_library_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("library_search");

    for entries in [1_000, 10_000] {
        let store = InMemoryReferenceStore::new(
            (0..entries)
                .map(|i| {
                    let mz = 600.0 + (i % 400) as f64 * 0.5 + (i / 400) as f64 * 0.0001;
                    let mut precursor_mz = BTreeMap::new();
                    precursor_mz.insert("[M+H]+".to_string(), mz);
                    ReferenceEntry {
                        name: format!("entry {i}"),
                        formula: String::new(),
                        class: "PC".to_string(),
                        category: "Glycerophospholipids".to_string(),
                        neutral_mass: mz - 1.007276,
                        precursor_mz,
                        spectrum: spectrum(50, (i % 7) as f64 * 0.01),
                    }
                })
                .collect(),
        );
        let features: Vec<Feature> = (0..200)
            .map(|i| {
                Feature::new(
                    format!("f{i}"),
                    600.0 + (i % 400) as f64 * 0.5,
                    IonMode::Positive,
                    "[M+H]+",
                    spectrum(50, 0.0),
                )
            })
            .collect();
        let search = DatabaseSearch::new(SearchParams::default());

        group.throughput(Throughput::Elements(features.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{entries}entries")),
            &features,
            |b, features| {
                b.iter(|| {
                    for feature in features {
                        black_box(search.search_feature(&store, feature).unwrap());
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_similarity_methods, bench_library_search);
criterion_main!(benches);
