use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use quire_core::{
    AuConfig, ConfigParser, EmittedRecord, MemoryContentSource, Resolver, SourceFormat, extract_raw, registry,
};

const PLUGIN: &str = r#"
name: Bench Journal
root: "%s%s/", base_url, volume
pattern: "^%s%s/[0-9]+/[^/]+\.html$", base_url, volume
aspect: /([^/]+)\.html$ => /$1.html => full_text_html, abstract
aspect: => /$1.pdf => full_text_pdf
aspect: => /$1.ris => citation_ris, article_metadata
full_text_from: full_text_pdf, full_text_html
schema: ris
"#;

fn ris(n: usize) -> String {
    format!(
        "TY  - JOUR\nT1  - Article {n}\nAU  - Author, A.\nAU  - Author, B.\nJO  - Bench Journal\nVL  - 8\nSP  - {n}\nDO  - 10.1234/bench.{n}\nER  -\n"
    )
}

fn resolver() -> Resolver {
    let au = AuConfig::new().with("base_url", "http://bench.example.org/").with("volume", "8");
    ConfigParser::parse_string(PLUGIN).unwrap().build(&au).unwrap()
}

fn au_source(articles: usize) -> MemoryContentSource {
    let mut source = MemoryContentSource::new();
    for n in 0..articles {
        let base = format!("http://bench.example.org/8/{}/article-{}", n % 12, n);
        source.insert(format!("{}.html", base), "<html><body>landing</body></html>");
        if n % 5 != 0 {
            source.insert(format!("{}.pdf", base), "%PDF-1.4");
        }
        source.insert(format!("{}.ris", base), ris(n));
    }
    source
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = resolver();
    let mut group = c.benchmark_group("resolve");

    for articles in [10, 100, 1000] {
        let source = au_source(articles);
        group.bench_with_input(BenchmarkId::new("articles", articles), &source, |b, source| {
            b.iter(|| {
                let mut records: Vec<EmittedRecord> = Vec::new();
                resolver.resolve(black_box(source), &mut records).unwrap();
                records
            })
        });
    }

    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let resolver = resolver();
    let source = au_source(1000);

    c.bench_function("assemble_1000", |b| b.iter(|| resolver.assemble(black_box(&source))));
}

fn bench_ris_extract_and_cook(c: &mut Criterion) {
    let schema = registry().lookup("ris").unwrap();
    let content = ris(42);

    c.bench_function("ris_extract_and_cook", |b| {
        b.iter(|| {
            let raw = extract_raw(&SourceFormat::Ris, "http://bench.example.org/a.ris", black_box(&content)).unwrap();
            schema.cook_map.cook(&raw[0])
        })
    });
}

fn bench_plugin_build(c: &mut Criterion) {
    let config = ConfigParser::parse_string(PLUGIN).unwrap();
    let au = AuConfig::new().with("base_url", "http://bench.example.org/").with("volume", "8");

    c.bench_function("plugin_build", |b| b.iter(|| config.build(black_box(&au))));
}

criterion_group!(
    benches,
    bench_resolve,
    bench_assemble,
    bench_ris_extract_and_cook,
    bench_plugin_build
);
criterion_main!(benches);
