//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use stepflow::prelude::*;

fn three_steps() -> Pipeline {
    Pipeline::builder("bench")
        .enable_logging(false)
        .body_schema(ObjectSchema::new().field("title", FieldRule::string()))
        .step_fn("load", |_data, ctx| async move { Ok(Outcome::ok(ctx.body().clone())) })
        .step_fn("tag", |data, _ctx| async move {
            Ok(Outcome::ok_with_metadata(
                data,
                Metadata::new().header("X-Bench", "1"),
            ))
        })
        .step(NoOpStep::new("pass"))
        .build()
        .unwrap()
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let pipeline = three_steps();

    c.bench_function("three_step_run", |b| {
        b.iter(|| {
            let request = Request::post("/tasks").with_body(json!({"title": "bench"}));
            black_box(runtime.block_on(pipeline.handle(request)))
        });
    });

    let timed = Pipeline::builder("bench-timeout")
        .enable_logging(false)
        .timeout(std::time::Duration::from_secs(5))
        .step(NoOpStep::new("pass"))
        .build()
        .unwrap();

    c.bench_function("run_with_timeout", |b| {
        b.iter(|| black_box(runtime.block_on(timed.handle(Request::get("/")))));
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
