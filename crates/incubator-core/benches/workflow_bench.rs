//! Benchmarks for the workflow hot paths.

use chrono::TimeZone;
use criterion::{Criterion, criterion_group, criterion_main};
use incubator_core::{
    Actor, AssessmentId, Role, ScoreCandidate, ScoringLedger, Timestamp, TransitionEngine,
    TransitionRequest, WorkflowAggregate, snapshot_from_bytes, snapshot_to_bytes,
};
use std::hint::black_box;

fn now() -> Timestamp {
    chrono::Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn scored_aggregate(id: usize, scores: usize) -> WorkflowAggregate {
    let admin = Actor::new("u-1", "Ari Admin", Role::Admin);
    let mut agg = WorkflowAggregate::new(AssessmentId::new(format!("a-{id}")), "Bench Co");
    for i in 0..scores {
        let version = agg.version();
        let _ = ScoringLedger::add_score(
            &mut agg,
            &ScoreCandidate::new(format!("category-{i}"), (i % 100) as i64, "bench"),
            &admin,
            version,
            now(),
        );
    }
    agg
}

fn bench_walk(c: &mut Criterion) {
    let admin = Actor::new("u-1", "Ari Admin", Role::Admin);
    c.bench_function("walk_all_stages", |b| {
        b.iter(|| {
            let mut agg = WorkflowAggregate::new(AssessmentId::new("a"), "Bench Co");
            for _ in 0..4 {
                let request = TransitionRequest::forward("next", agg.version());
                let _ = TransitionEngine::request_transition(&mut agg, &request, &admin, now());
            }
            black_box(agg)
        });
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let aggregates: Vec<WorkflowAggregate> = (0..100).map(|i| scored_aggregate(i, 20)).collect();
    let bytes = snapshot_to_bytes(&aggregates).unwrap_or_default();

    c.bench_function("snapshot_encode_100", |b| {
        b.iter(|| black_box(snapshot_to_bytes(black_box(&aggregates))))
    });
    c.bench_function("snapshot_decode_100", |b| {
        b.iter(|| black_box(snapshot_from_bytes(black_box(&bytes))))
    });
}

criterion_group!(benches, bench_walk, bench_snapshot);
criterion_main!(benches);
