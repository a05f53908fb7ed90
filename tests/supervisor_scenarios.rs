// tests/supervisor_scenarios.rs

mod common;
use crate::common::builders::{event, writes, HarnessBuilder};
use crate::common::fake_backend::BackendCall;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use devloop::errors::WatchError;
use devloop::supervisor::{DropReason, EventOutcome, SupervisorPhase};
use devloop::watch::{ChangeEvent, ChangeKind, ExclusionSet, WatchAdapter};
use tokio::time::advance;

type TestResult = Result<(), Box<dyn Error>>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn first_write_launches_then_self_trigger_and_debounce_apply() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();
    let sup = &h.supervisor;

    assert_eq!(sup.phase(), SupervisorPhase::Idle);
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./main.go")).await,
        EventOutcome::Restarted
    );
    assert_eq!(sup.phase(), SupervisorPhase::Running);
    assert!(sup.has_process().await);
    assert_eq!(h.backend.start_count(), 1);
    assert_eq!(h.backend.terminate_count(), 0);

    advance(ms(300)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./main.go")).await,
        EventOutcome::Dropped(DropReason::SelfTrigger)
    );

    advance(ms(1700)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./main.go")).await,
        EventOutcome::Restarted
    );

    assert_eq!(
        h.backend.calls(),
        vec![
            BackendCall::Start {
                id: 1,
                command: "echo hello".to_string()
            },
            BackendCall::Terminate { id: 1 },
            BackendCall::Start {
                id: 2,
                command: "echo hello".to_string()
            },
        ]
    );
    assert_eq!(h.backend.live(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn events_inside_the_window_are_debounced_after_suppression_is_spent() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();
    let sup = &h.supervisor;

    sup.handle_event(ChangeEvent::write("./main.go")).await;
    // Consumed by self-trigger suppression.
    sup.handle_event(ChangeEvent::write("./main.go")).await;

    advance(ms(500)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./util.go")).await,
        EventOutcome::Dropped(DropReason::Debounced)
    );

    advance(ms(500)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./util.go")).await,
        EventOutcome::Restarted
    );
    assert_eq!(h.backend.start_count(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn excluded_paths_never_restart() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello")
        .config(|b| b.exclusions(ExclusionSet::new(["node_modules"])))
        .build();
    let sup = &h.supervisor;

    sup.handle_event(ChangeEvent::write("./main.go")).await;
    sup.handle_event(ChangeEvent::write("./main.go")).await;

    advance(ms(5000)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./node_modules/foo.js")).await,
        EventOutcome::Dropped(DropReason::Excluded)
    );
    assert_eq!(
        sup.handle_event(ChangeEvent::create("./web/node_modules/react/index.js")).await,
        EventOutcome::Dropped(DropReason::Excluded)
    );
    assert_eq!(h.backend.start_count(), 1);
    assert_eq!(h.backend.terminate_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn only_writes_and_creations_restart() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();
    let sup = &h.supervisor;

    for kind in [
        ChangeKind::Remove,
        ChangeKind::Rename,
        ChangeKind::Chmod,
        ChangeKind::Other,
    ] {
        assert_eq!(
            sup.handle_event(event("./main.go", kind)).await,
            EventOutcome::Dropped(DropReason::IgnoredKind)
        );
    }
    assert_eq!(h.backend.start_count(), 0);

    assert_eq!(
        sup.handle_event(event("./new.go", ChangeKind::Create)).await,
        EventOutcome::Restarted
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn launch_failure_leaves_supervisor_idle() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo").build();
    let sup = &h.supervisor;

    assert_eq!(
        sup.handle_event(ChangeEvent::write("./main.go")).await,
        EventOutcome::LaunchFailed
    );
    assert_eq!(sup.phase(), SupervisorPhase::Idle);
    assert!(!sup.has_process().await);
    assert!(h.backend.calls().is_empty());

    // No suppression is armed after a failed launch.
    advance(ms(1000)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./main.go")).await,
        EventOutcome::LaunchFailed
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_relaunch_still_terminates_the_old_process() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();
    let sup = &h.supervisor;

    sup.handle_event(ChangeEvent::write("./main.go")).await;
    sup.handle_event(ChangeEvent::write("./main.go")).await;

    h.backend.fail_next_starts(1);
    advance(ms(1000)).await;
    assert_eq!(
        sup.handle_event(ChangeEvent::write("./main.go")).await,
        EventOutcome::LaunchFailed
    );

    assert_eq!(h.backend.terminate_count(), 1);
    assert_eq!(h.backend.live(), 0);
    assert!(!sup.has_process().await);
    assert_eq!(sup.phase(), SupervisorPhase::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn settle_pause_separates_terminate_and_start() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello")
        .config(|b| b.settle(ms(2000)))
        .build();
    let sup = h.supervisor.clone();

    let start = tokio::time::Instant::now();
    sup.handle_event(ChangeEvent::write("./main.go")).await;
    assert!(start.elapsed() >= ms(2000));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn exit_without_events_returns_promptly() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();

    let sup = h.supervisor.clone();
    let task = tokio::spawn(async move { sup.run().await });

    h.adapter.exit();
    with_timeout(task).await??;

    assert!(h.backend.calls().is_empty());
    assert_eq!(h.supervisor.phase(), SupervisorPhase::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn run_loop_walks_the_tree_and_restarts_on_events() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("go run main.go")
        .config(|b| b.exclusions(ExclusionSet::new(["node_modules"])))
        .build();
    h.fs.add_file("./main.go", "package main");
    h.fs.add_file("./pkg/util.go", "package pkg");
    h.fs.add_file("./node_modules/x/index.js", "");

    let mut phase = h.supervisor.subscribe_phase();
    let sup = h.supervisor.clone();
    let task = tokio::spawn(async move { sup.run().await });

    for e in writes(["./main.go"]) {
        assert!(h.adapter.emit(e));
    }
    with_timeout(phase.wait_for(|p| *p == SupervisorPhase::Running)).await?;

    assert_eq!(
        h.adapter.watched(),
        vec![PathBuf::from("."), PathBuf::from("./pkg")]
    );

    // Adapter errors are logged and the loop keeps going.
    assert!(h.adapter.emit_error(WatchError::Backend("queue overflow".to_string())));

    h.adapter.exit();
    with_timeout(task).await??;

    assert_eq!(h.backend.start_count(), 1);
    assert!(h.supervisor.has_process().await);

    h.supervisor.stop_process().await;
    assert_eq!(h.backend.terminate_count(), 1);
    assert_eq!(h.backend.live(), 0);
    assert_eq!(h.supervisor.phase(), SupervisorPhase::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn run_fails_when_the_tree_cannot_be_listed() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();
    h.fs.fail_read_dir("./secret");

    let err = h.supervisor.run().await.unwrap_err();
    assert!(matches!(err, devloop::errors::DevloopError::Startup { .. }));
    assert!(h.backend.calls().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn streams_can_only_be_consumed_once() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();

    let _streams = h.adapter.take_streams().expect("first take");
    let err = h.supervisor.run().await.unwrap_err();
    assert!(matches!(
        err,
        devloop::errors::DevloopError::Watch(WatchError::StreamsTaken)
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_without_process_is_a_no_op() -> TestResult {
    init_tracing();
    let h = HarnessBuilder::new("echo hello").build();
    h.supervisor.stop_process().await;
    assert!(h.backend.calls().is_empty());
    Ok(())
}
