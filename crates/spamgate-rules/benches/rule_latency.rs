//! Latency benchmarks for rule-set evaluation
//!
//! Run with: cargo bench -p spamgate-rules

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spamgate_rules::RuleSet;

fn benchmark_standard_rules(c: &mut Criterion) {
    let set = RuleSet::standard().expect("Failed to build rule set");

    let test_cases = vec![
        ("clean_short", "Beautiful sunset tonight."),
        ("clean_long", "Working on a new project today. TypeScript is really growing on me, and the tooling keeps getting better every release."),
        ("keywords_caps", "FREE MONEY!!! CLICK HERE NOW!!! GUARANTEED RESULTS!!!"),
        ("emojis", "🎉🎉🎉🎉🎉🎉 AMAZING DEAL! 🔥🔥🔥🔥🔥 LIMITED TIME! 💰💰💰"),
        ("urls", "Check out http://bit.ly/scam1 and http://tinyurl.com/spam2 and http://bit.ly/fake3"),
    ];

    let mut group = c.benchmark_group("Standard_Rule_Set");
    group.sample_size(100);

    for (name, text) in test_cases {
        group.bench_with_input(BenchmarkId::new("evaluate", name), &text, |b, text| {
            b.iter(|| set.evaluate(black_box(text)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_standard_rules);
criterion_main!(benches);
