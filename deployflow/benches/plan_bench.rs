//! Benchmarks for graph finalization and plan generation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deployflow::blueprints::{model_deploy_composition, model_deploy_pipeline};
use deployflow::core::Action;
use deployflow::pipeline::PipelineBuilder;
use deployflow::testing::sample_environment;

fn wide_pipeline(stages: usize, actions: usize) -> PipelineBuilder {
    let mut builder = PipelineBuilder::new("wide");
    for s in 0..stages {
        let stage_actions = (0..actions).map(|a| {
            let mut action = Action::new(format!("a{a}"))
                .with_rank(u32::try_from(a % 4).unwrap_or(0) + 1)
                .with_output(format!("s{s}a{a}"));
            if s > 0 {
                action = action.with_input(format!("s{}a{a}", s - 1));
            }
            action
        });
        builder = builder.stage(format!("stage{s}"), stage_actions).unwrap();
    }
    builder
}

fn plan_benchmark(c: &mut Criterion) {
    let env = sample_environment();

    c.bench_function("blueprint_finalize_and_plan", |b| {
        b.iter(|| {
            let mut graph = model_deploy_pipeline(black_box(&env)).unwrap();
            graph.finalize().unwrap();
            black_box(graph.linear_plan().unwrap())
        });
    });

    c.bench_function("blueprint_compose", |b| {
        b.iter(|| {
            let mut app = model_deploy_composition(black_box(&env)).unwrap();
            black_box(app.compose().unwrap())
        });
    });

    let wide = wide_pipeline(20, 16);
    c.bench_function("wide_finalize_and_plan", |b| {
        b.iter(|| {
            let graph = wide.clone().build().unwrap();
            black_box(graph.linear_plan().unwrap())
        });
    });
}

criterion_group!(benches, plan_benchmark);
criterion_main!(benches);
