mod common;

use common::{FakeTransport, ScriptedLink, file_count, test_config, wait_until};
use field_device::message::{AggregateOutcome, CategorizedAggregator, ConnectionState, LastBriefing};
use field_device::printing::{BriefingRenderer, JobStatus, PrintWorker, WorkerSettings, queue};
use field_device::FieldDevice;
use shared::Category;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_briefing_reflects_latest_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    let (queue, jobs) = queue::channel(4);
    let mut aggregator = CategorizedAggregator::new(
        Category::defaults(),
        Arc::new(BriefingRenderer::default()),
        queue.clone(),
        LastBriefing::new(),
    );

    let outcomes = [
        aggregator.on_message("briefing/weather", br#"{"t":70}"#),
        aggregator.on_message("briefing/market", br#"{"idx":100}"#),
        aggregator.on_message("briefing/weather", br#"{"t":72}"#),
        aggregator.on_message("briefing/security", br#"{"lvl":"low"}"#),
    ];
    let submitted = outcomes
        .iter()
        .filter(|o| matches!(o, AggregateOutcome::Submitted { .. }))
        .count();
    assert_eq!(submitted, 1);
    assert!(matches!(outcomes[3], AggregateOutcome::Submitted { .. }));
    assert!(aggregator.bundle().is_empty());
    assert_eq!(queue.pending(), 1);

    let (reports_tx, mut reports) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let worker = PrintWorker::new(
        transport.clone(),
        WorkerSettings {
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
            temp_dir: dir.path().to_path_buf(),
            options: Default::default(),
        },
    )
    .with_reports(reports_tx);
    let handle = tokio::spawn(worker.run(jobs, shutdown.clone()));

    let report = reports.recv().await.unwrap();
    assert_eq!(report.job.status, JobStatus::Succeeded);
    assert!(report.job.job_name.starts_with("briefing_"));

    let printed = transport.submissions()[0].text();
    assert!(printed.contains("t: 72"));
    assert!(!printed.contains("t: 70"));
    assert!(printed.contains("idx: 100"));
    assert!(printed.contains("lvl: low"));
    assert!(printed.contains("End of Briefing - Confidential Information"));
    assert_eq!(file_count(dir.path()), 0);

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_device_prints_briefing_from_broker() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    let config = test_config(dir.path());
    let temp_dir = config.print.temp_dir.clone();

    let link = ScriptedLink::connected_with(&[
        ("briefing/weather", r#"{"temperature":72,"condition":"Clear"}"#),
        ("briefing/market", "not json"),
        ("briefing/market", r#"{"indices":[{"name":"S&P 500","value":5000,"change":1.2}]}"#),
        ("briefing/security", r#"{"threat_level":"LOW","alerts":[]}"#),
    ]);
    let subscriptions = link.subscriptions.clone();

    let mut device = FieldDevice::with_transport(config, transport.clone());
    device.start_with(link, None).unwrap();

    let mut state = device.connection_state().unwrap();
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();
    assert!(wait_until(|| subscriptions.lock().len() == 1).await);
    assert_eq!(subscriptions.lock()[0], "briefing/#");

    assert!(wait_until(|| transport.submissions().len() == 1).await);
    let printed = transport.submissions()[0].text();
    assert!(printed.contains("WEATHER"));
    assert!(printed.contains("Clear"));
    assert!(printed.contains("S&P 500"));
    assert!(device.last_briefing().get().is_some());

    assert!(wait_until(|| file_count(&temp_dir) == 0).await);
    assert!(device.check_health().is_healthy());
    device.shutdown().await;
}

#[tokio::test]
async fn test_device_queues_test_page_on_prepare() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    let mut config = test_config(dir.path());
    config.print_test_page_on_start = true;

    let mut device = FieldDevice::with_transport(config, transport.clone());
    assert!(device.verify_printer().await.unwrap().is_some());
    device.prepare().await.unwrap();
    device
        .start_with(ScriptedLink::connected_with(&[]), None)
        .unwrap();

    assert!(wait_until(|| transport.submissions().len() == 1).await);
    let submission = transport.submissions().remove(0);
    assert!(submission.job_name.starts_with("test_page_"));
    assert!(submission.text().contains("TEST PAGE"));

    device.shutdown().await;
}

#[tokio::test]
async fn test_unknown_printer_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::new();
    transport.push_status(Err(briefing_printer::PrintError::NotFound("KX-P1592".into())));

    let device = FieldDevice::with_transport(test_config(dir.path()), transport);
    assert!(device.verify_printer().await.is_err());
}

#[tokio::test]
async fn test_device_cannot_start_twice() {
    let dir = tempfile::tempdir().unwrap();
    let mut device = FieldDevice::with_transport(test_config(dir.path()), FakeTransport::new());
    device
        .start_with(ScriptedLink::connected_with(&[]), None)
        .unwrap();
    assert!(
        device
            .start_with(ScriptedLink::connected_with(&[]), None)
            .is_err()
    );
    device.shutdown().await;
}
