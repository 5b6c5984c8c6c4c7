use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hwcatalog_gateway::application::classifier::{self, ClassifyOptions};
use hwcatalog_gateway::application::extractor;
use hwcatalog_gateway::domain::{InternalCategory, ProductQuery, RawProduct, TaxonomyRef};

fn gpu_record() -> RawProduct {
    let mut record = RawProduct {
        id: 1,
        name: "ASUS ROG Strix GeForce RTX 4080 16GB GDDR6X OC Edition".to_string(),
        status: hwcatalog_gateway::domain::ProductStatus::Publish,
        description: "Boost clock 2625 MHz, PCIe 4.0, TDP 320W, triple-fan cooling \
                      for high refresh rate 4K gaming"
            .to_string(),
        ..Default::default()
    };
    record.categories.push(TaxonomyRef {
        id: 15,
        name: "Graphics Cards".to_string(),
        slug: "graphic-cards".to_string(),
    });
    record
}

/// Benchmark the classifier fallback chain
fn benchmark_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    let options = ClassifyOptions::default();

    let by_slug = gpu_record();
    group.bench_function("taxonomy_slug_hit", |b| {
        b.iter(|| black_box(classifier::classify(&by_slug, &options)));
    });

    let mut by_keyword = gpu_record();
    by_keyword.categories.clear();
    group.bench_function("keyword_fallback", |b| {
        b.iter(|| black_box(classifier::classify(&by_keyword, &options)));
    });

    group.bench_function("slug_lookup", |b| {
        b.iter(|| black_box(classifier::lookup_slug("gaming-mouse-collection")));
    });

    group.finish();
}

/// Benchmark spec and compatibility extraction
fn benchmark_extractor(c: &mut Criterion) {
    let mut group = c.benchmark_group("extractor");
    let record = gpu_record();

    group.bench_function("extract_specs_gpu", |b| {
        b.iter(|| black_box(extractor::extract_specs(&record, InternalCategory::Gpu)));
    });

    group.bench_function("extract_compatibility", |b| {
        b.iter(|| black_box(extractor::extract_compatibility(&record, InternalCategory::Gpu)));
    });

    group.bench_function("detect_brand", |b| {
        b.iter(|| black_box(extractor::detect_brand(&record.name)));
    });

    group.finish();
}

/// Benchmark cache signature construction
fn benchmark_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");

    let query = ProductQuery {
        category_id: Some(15),
        search: Some("rtx 4080".to_string()),
        page: 2,
        per_page: 24,
        orderby: Some("price".to_string()),
        featured: Some(true),
        all_pages: false,
    };

    group.bench_function("query_signature", |b| {
        b.iter(|| black_box(query.signature()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_classifier,
    benchmark_extractor,
    benchmark_signature
);
criterion_main!(benches);
