//! Ingestion and evaluation running at the same time

use std::sync::Arc;
use vitals_monitor::engine::{CollectingSink, EvaluationEngine};
use vitals_monitor::health::{MeasurementKind, MeasurementStore, PatientId};
use vitals_monitor::DetectorThresholds;

const PATIENTS: i32 = 8;
const READINGS: i64 = 500;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_record_and_evaluate() {
    let store = Arc::new(MeasurementStore::new());
    let sink = Arc::new(CollectingSink::new());
    let engine = Arc::new(EvaluationEngine::with_standard_detectors(
        store.clone(),
        sink.clone(),
        &DetectorThresholds::default(),
    ));

    let mut producers = Vec::new();
    for id in 0..PATIENTS {
        let store = store.clone();
        producers.push(tokio::task::spawn_blocking(move || {
            for i in 0..READINGS {
                store
                    .record(PatientId(id), MeasurementKind::Saturation, 97.0, i * 1_000)
                    .unwrap();
                store
                    .record(PatientId(id), MeasurementKind::HeartRateProxy, 72.0, i * 1_000)
                    .unwrap();
            }
        }));
    }

    let mut evaluators = Vec::new();
    for id in 0..PATIENTS {
        let engine = engine.clone();
        evaluators.push(tokio::task::spawn_blocking(move || {
            for round in 0..50 {
                let summary = engine.evaluate(PatientId(id), round * 10_000).unwrap();
                assert_eq!(summary.faults, 0);
            }
        }));
    }

    for task in producers.into_iter().chain(evaluators) {
        task.await.unwrap();
    }

    // every reading is visible once its record call returned
    for id in 0..PATIENTS {
        assert_eq!(store.measurement_count(PatientId(id)), 2 * READINGS as usize);
        let window = store.range(PatientId(id), 0, (READINGS - 1) * 1_000);
        assert_eq!(window.len(), 2 * READINGS as usize);
    }
    assert_eq!(store.list_patients().len(), PATIENTS as usize);

    // steady, normal readings never alert
    assert!(sink.is_empty(), "unexpected alerts: {:?}", sink.alerts());
}

#[tokio::test]
async fn test_readers_see_whole_measurements() {
    let store = Arc::new(MeasurementStore::new());
    let writer = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            for i in 0..2_000 {
                store
                    .record(PatientId(1), MeasurementKind::SystolicPressure, i as f64, i)
                    .unwrap();
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..200 {
                let window = store.range(PatientId(1), 0, i64::MAX);
                for m in window.iter() {
                    assert_eq!(m.value, m.timestamp_millis as f64);
                    assert_eq!(m.kind, MeasurementKind::SystolicPressure);
                }
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(store.measurement_count(PatientId(1)), 2_000);
}
