//! Provider shutdown through the public handle.

use std::time::Duration;

use otelkit::{Context, KitConfig, OtelKit};

mod common;
use common::{test_config, test_kit};

#[tokio::test]
async fn test_shutdown_twice_is_ok() {
    let t = test_kit();

    t.kit
        .trace_function(&Context::new(), "before-shutdown", &[], |_| async {
            Ok::<_, String>(())
        })
        .await
        .unwrap();
    assert_eq!(t.finished_spans().len(), 1);

    assert!(t.kit.shutdown(Duration::from_secs(5)).await.is_ok());
    assert!(t.kit.shutdown(Duration::from_secs(5)).await.is_ok());
}

#[tokio::test]
async fn test_shutdown_with_disabled_signals() {
    let kit = OtelKit::new(KitConfig {
        metrics_enabled: false,
        logs_enabled: false,
        ..test_config()
    })
    .unwrap();

    assert!(kit.shutdown(Duration::from_secs(1)).await.is_ok());
}

#[tokio::test]
async fn test_facade_after_shutdown_does_not_fail() {
    let t = test_kit();
    t.kit.shutdown(Duration::from_secs(5)).await.unwrap();

    let result = t
        .kit
        .trace_function(&Context::new(), "late", &[], |_| async { Ok::<_, String>(3) })
        .await;
    t.kit.log_info(&Context::new(), "late log", &[]);
    t.kit.record_metric("late", 1, &[]);

    assert_eq!(result, Ok(3));
}
