//! Benchmarks for query compilation, search execution, and CSV ingestion.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use materials_db::compile::{QueryCompiler, QueryDescription};
use materials_db::engine::{Engine, EngineConfig};
use materials_db::fulltext::TokenIndex;
use materials_db::operator::Operator;
use materials_db::schema::validate_search;
use materials_db::store::MemStore;

const QUERY: &[u8] = br#"{"compound":{"logic":"contains","value":"O"},
    "properties":[{"name":"mass","value":"50","logic":">="},
                  {"name":"structure","value":"rutile","logic":"eq"}]}"#;

fn sample_csv(rows: usize) -> Vec<u8> {
    const COMPOUNDS: [&str; 6] = ["TiO2", "SiO2", "NaCl", "Fe2O3", "CuSO4·5H2O", "LiCoO2"];
    let mut csv = String::from("Chemical formula,property,value\n");
    for i in 0..rows {
        let compound = COMPOUNDS[i % COMPOUNDS.len()];
        let structure = if i % 3 == 0 { "rutile" } else { "cubic" };
        csv.push_str(&format!("{compound},mass,{},structure,{structure}\n", 20 + i % 200));
    }
    csv.into_bytes()
}

fn bench_resolve(c: &mut Criterion) {
    c.bench_function("resolve_operator_aliases", |bench| {
        bench.iter(|| {
            for token in ["gt", ">=", "contains", "le", "match", "nope"] {
                black_box(Operator::resolve(black_box(token)));
            }
        })
    });
}

fn bench_compile(c: &mut Criterion) {
    let store = MemStore::new();
    let index = TokenIndex::new();
    let compiler = QueryCompiler::new(&store, Some(&index));

    c.bench_function("validate_and_compile", |bench| {
        bench.iter(|| {
            let document = validate_search(black_box(QUERY)).unwrap();
            let query = QueryDescription::new(document, None);
            black_box(compiler.compile(&query).unwrap())
        })
    });
}

fn bench_upload(c: &mut Criterion) {
    let csv = sample_csv(1_000);

    c.bench_function("upload_1k_rows", |bench| {
        bench.iter(|| {
            let engine = Engine::new(EngineConfig::default()).unwrap();
            black_box(engine.upload(&csv).unwrap())
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    engine.upload(&sample_csv(5_000)).unwrap();

    c.bench_function("search_5k_materials", |bench| {
        bench.iter(|| black_box(engine.search(QUERY, None).unwrap()))
    });

    c.bench_function("search_5k_with_term", |bench| {
        bench.iter(|| black_box(engine.search(b"{}", Some("rutile")).unwrap()))
    });
}

criterion_group!(benches, bench_resolve, bench_compile, bench_upload, bench_search);
criterion_main!(benches);
