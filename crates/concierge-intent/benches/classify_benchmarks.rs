//! Benchmarks for free-text classification.
//!
//! Classification runs on every submitted message before any network call,
//! so it should stay well under a millisecond even for the worst case where
//! no rule matches and every pattern is evaluated.

use std::time::Duration;

use concierge_core::Language;
use concierge_intent::IntentClassifier;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn sample_inputs() -> Vec<(&'static str, &'static str, Language)> {
    vec![
        ("first_rule", "Can I book an appointment next week", Language::En),
        ("mid_rule", "I want to improve my English speaking", Language::En),
        ("last_rule", "is there a festival coming up soon", Language::En),
        ("vietnamese", "Tôi cần giúp đỡ về khai thuế năm nay", Language::Vi),
        (
            "unmatched",
            "what is the best way to cook rice noodles at home for a large family dinner",
            Language::En,
        ),
        ("short", "hello there", Language::En),
    ]
}

fn bench_classify(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let mut group = c.benchmark_group("classify");
    group.measurement_time(Duration::from_secs(5));

    for (name, text, language) in sample_inputs() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| classifier.classify(std::hint::black_box(text), language))
        });
    }

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    c.bench_function("classifier_new", |b| b.iter(IntentClassifier::new));
}

criterion_group!(benches, bench_classify, bench_construction);
criterion_main!(benches);
