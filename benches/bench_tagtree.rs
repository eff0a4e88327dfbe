#![allow(
    clippy::tests_outside_test_module,
    clippy::unwrap_used,
    reason = "benchmark"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tagtree::{Context, TagRegistry, Template, Tree, lex};

mod utils;

fn tagtree_benchmark(c: &mut Criterion) {
    // Generate 100 random templates
    let sources = utils::generate_random_templates(100);
    let tags = TagRegistry::new();
    let templates: Vec<Template> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| Template::new(format!("t{i}"), source.as_str(), &tags).unwrap())
        .collect();
    let context = Context::new();

    // Print binary size information
    utils::print_binary_size();

    let mut group = c.benchmark_group("Template Rendering");
    group.sample_size(50);

    group.bench_function("tagtree_lex", |b| {
        b.iter(|| {
            for source in &sources {
                black_box(lex("bench", source).count());
            }
        });
    });

    group.bench_function("tagtree_parse", |b| {
        b.iter(|| {
            for source in &sources {
                let mut tree = Tree::new("bench");
                tree.parse(source).unwrap();
                black_box(tree);
            }
        });
    });

    group.bench_function("tagtree_render", |b| {
        b.iter(|| {
            for template in &templates {
                black_box(template.render(&context).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, tagtree_benchmark);
criterion_main!(benches);
