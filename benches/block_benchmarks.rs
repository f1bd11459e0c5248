//! Criterion benchmarks for the block builder pipeline.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure template compilation (cold and cached),
//! property resolution, document loading and region rendering at a few
//! page sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use block_builder::core::generate_child_id;
use block_builder::store::MemoryLoader;
use block_builder::transform::node::NodeAttribute;
use block_builder::{
    BlockDocument, BlockEngine, DynamicSource, PropertyTransformers, RenderMode, SourceId,
    TemplateNode,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Layout with `n` sections, each holding a heading and a text component
fn layout(n: usize) -> Vec<TemplateNode> {
    let mut nodes: Vec<TemplateNode> = (0..n)
        .map(|i| {
            TemplateNode::component("blocks::section")
                .with_attribute(NodeAttribute::literal("title", format!("Section {}", i)))
                .with_children(vec![
                    TemplateNode::component("blocks::heading"),
                    TemplateNode::component("blocks::text"),
                ])
        })
        .collect();
    nodes.push(TemplateNode::directive("region", Some("'main'")));
    nodes.push(TemplateNode::directive("blocksScripts", None));
    nodes
}

/// Page document with `n` sections of two text blocks in region `main`
fn page_json(n: usize) -> String {
    let mut blocks = Map::new();
    let mut roots = Vec::new();
    for i in 0..n {
        let section = format!("s{}", i);
        let children: Vec<String> = (0..2).map(|j| format!("t{}-{}", i, j)).collect();
        for child in &children {
            blocks.insert(
                child.clone(),
                json!({
                    "type": "text",
                    "parentId": section,
                    "properties": {"content": format!("Paragraph {}", child)}
                }),
            );
        }
        blocks.insert(
            section.clone(),
            json!({"type": "section", "properties": {"title": "Title"}, "children": children}),
        );
        roots.push(section);
    }
    json!({"blocks": blocks, "regions": [{"name": "main", "blocks": roots}]}).to_string()
}

fn engine_with_page(n: usize) -> (BlockEngine, SourceId) {
    let source = SourceId::hash(format!("page-{}", n));
    let loader = Arc::new(MemoryLoader::new());
    loader.insert(source.clone(), page_json(n));
    let engine = BlockEngine::builder().loader(loader).build().unwrap();
    (engine, source)
}

// ---------------------------------------------------------------------------
// Compilation Benchmarks
// ---------------------------------------------------------------------------

fn bench_compile_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_cold");

    for count in [10, 100, 500] {
        let engine = BlockEngine::builder().build().unwrap();
        let nodes = layout(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| {
                engine.clear();
                black_box(engine.compile_template(nodes.clone(), RenderMode::Live).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_compile_cached(c: &mut Criterion) {
    let engine = BlockEngine::builder().build().unwrap();
    let nodes = layout(100);
    engine.compile_template(nodes.clone(), RenderMode::Live).unwrap();

    c.bench_function("compile_cached_100", |b| {
        b.iter(|| black_box(engine.compile_template(nodes.clone(), RenderMode::Live).unwrap()));
    });
}

fn bench_child_ids(c: &mut Criterion) {
    c.bench_function("generate_child_id", |b| {
        b.iter(|| black_box(generate_child_id(black_box("5f0c2e7a-parent"), black_box("text-3"))));
    });
}

// ---------------------------------------------------------------------------
// Property Benchmarks
// ---------------------------------------------------------------------------

fn bench_apply_all(c: &mut Criterion) {
    let engine = BlockEngine::builder().build().unwrap();
    let schema = engine.registry().get("columns").unwrap();
    let chain = PropertyTransformers::with_defaults();

    let mut plain = Map::new();
    plain.insert("count".into(), json!("3"));
    let mut dynamic = Map::new();
    dynamic.insert(
        "count".into(),
        DynamicSource::new("layout.columns", "number", json!({"layout": {"columns": 4}}))
            .to_value(),
    );

    let mut group = c.benchmark_group("apply_all");
    for (name, props) in [("coerced", plain), ("dynamic", dynamic)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &props, |b, props| {
            b.iter(|| black_box(chain.apply_all(props, &schema).unwrap()));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Store and Render Benchmarks
// ---------------------------------------------------------------------------

fn bench_document_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_parse");

    for count in [10, 100, 1_000] {
        let json = page_json(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &json, |b, json| {
            b.iter(|| black_box(BlockDocument::from_json(json).unwrap()));
        });
    }
    group.finish();
}

fn bench_render_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_region");

    for count in [10, 100, 1_000] {
        let (engine, source) = engine_with_page(count);
        for mode in [RenderMode::Live, RenderMode::Preview] {
            let id = BenchmarkId::new(format!("{:?}", mode), count);
            group.bench_function(id, |b| {
                b.iter(|| black_box(engine.render_region(&source, "main", mode).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_update_delta(c: &mut Criterion) {
    let blocks: Map<String, Value> = (0..200)
        .map(|i| (format!("b{}", i), json!({"type": "text", "parentId": null})))
        .collect();
    let updated: Vec<String> = (0..200).step_by(2).map(|i| format!("b{}", i)).collect();
    let request = block_builder::UpdateRequest::from_json(json!({
        "blocks": blocks,
        "changes": {"updated": updated, "removed": ["b1", "b3"]}
    }))
    .unwrap();

    c.bench_function("update_delta_200", |b| {
        b.iter(|| black_box(request.delta().unwrap()));
    });
}

criterion_group!(
    benches,
    bench_compile_cold,
    bench_compile_cached,
    bench_child_ids,
    bench_apply_all,
    bench_document_parse,
    bench_render_region,
    bench_update_delta,
);
criterion_main!(benches);
