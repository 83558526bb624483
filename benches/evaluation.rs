use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use vitals_monitor::engine::{CollectingSink, EvaluationEngine};
use vitals_monitor::health::{MeasurementKind, MeasurementStore, PatientId};
use vitals_monitor::DetectorThresholds;

const PATIENT: PatientId = PatientId(1);
const DAY: i64 = 86_400_000;

/// One day of readings, one of each kind per second
fn populated_store() -> Arc<MeasurementStore> {
    let store = Arc::new(MeasurementStore::new());
    for second in 0..DAY / 1_000 {
        let ts = second * 1_000;
        let wobble = (second % 7) as f64;
        store
            .record(PATIENT, MeasurementKind::SystolicPressure, 120.0 + wobble, ts)
            .unwrap();
        store
            .record(PATIENT, MeasurementKind::DiastolicPressure, 80.0 + wobble, ts)
            .unwrap();
        store
            .record(PATIENT, MeasurementKind::Saturation, 97.0, ts)
            .unwrap();
        store
            .record(PATIENT, MeasurementKind::HeartRateProxy, 70.0 + wobble, ts)
            .unwrap();
    }
    store
}

fn bench_range(c: &mut Criterion) {
    let store = populated_store();
    c.bench_function("range_last_10_minutes", |b| {
        b.iter(|| store.range(black_box(PATIENT), DAY - 600_000, DAY))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let store = populated_store();
    let sink = Arc::new(CollectingSink::new());
    let engine = EvaluationEngine::with_standard_detectors(
        store,
        sink.clone(),
        &DetectorThresholds::default(),
    );

    c.bench_function("evaluate_standard_detectors", |b| {
        b.iter(|| {
            engine.evaluate(black_box(PATIENT), DAY).unwrap();
            sink.take()
        })
    });
}

criterion_group!(benches, bench_range, bench_evaluate);
criterion_main!(benches);
