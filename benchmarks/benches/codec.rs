//! Benchmarks du codec (Criterion)
//!
//! ▶ Paramètres via variables d'environnement :
//!   - CRIT_SAMPLES      (def=60)   — taille d'échantillon Criterion
//!   - CRIT_MEASURE_MS   (def=1000) — fenêtre de mesure en ms
//!
//! Suites :
//!   1) decode / encode du template réel
//!   2) instantiate (décodage + éditions + encodage vérifié)
//!   3) grow — une constante `vector<u8>` de taille croissante, décalage des tables suivantes

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use movetpl_module::{decode, encode, instantiate, AliasTable, TemplateEdits};

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(default)
}

fn template() -> Vec<u8> { movetpl_benches::template().expect("fixture base64") }

fn bench_codec(c: &mut Criterion) {
    let bytes = template();
    let module = decode(&bytes).expect("fixture decodes");

    let mut g = c.benchmark_group("codec");
    g.throughput(Throughput::Bytes(bytes.len() as u64));
    g.bench_function("decode", |b| b.iter(|| decode(black_box(&bytes)).expect("decode")));
    g.bench_function("encode", |b| b.iter(|| encode(black_box(&module)).expect("encode")));
    g.bench_function("encode_checked", |b| b.iter(|| black_box(&module).encode_checked().expect("encode")));
    g.finish();
}

fn bench_instantiate(c: &mut Criterion) {
    let bytes = template();
    let aliases: AliasTable = [("constant_0", "TOTAL_SUPPLY"), ("constant_2", "SYMBOL")].into_iter().collect();
    let edits = TemplateEdits {
        module_name: Some("gold".into()),
        constants: [("TOTAL_SUPPLY".to_string(), "2100000000000000".to_string()), ("SYMBOL".to_string(), "GLD".to_string())]
            .into_iter()
            .collect(),
        ..TemplateEdits::default()
    };
    c.bench_function("instantiate", |b| {
        b.iter(|| instantiate(black_box(&bytes), &edits, &aliases).expect("instantiate"));
    });
}

fn bench_grow(c: &mut Criterion) {
    let module = decode(&template()).expect("fixture decodes");
    let mut g = c.benchmark_group("grow");
    for kib in [1usize, 16, 256] {
        let text = "x".repeat(kib * 1024);
        g.throughput(Throughput::Bytes(text.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(format!("{kib}KiB")), &text, |b, text| {
            b.iter(|| {
                let mut m = module.clone();
                m.replace_constant(2, text).expect("replace");
                encode(&m).expect("encode")
            });
        });
    }
    g.finish();
}

fn config() -> Criterion {
    Criterion::default()
        .sample_size(usize::try_from(env_u64("CRIT_SAMPLES", 60)).unwrap_or(60))
        .measurement_time(Duration::from_millis(env_u64("CRIT_MEASURE_MS", 1000)))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_codec, bench_instantiate, bench_grow
}
criterion_main!(benches);
