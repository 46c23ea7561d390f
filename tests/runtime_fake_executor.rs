// tests/runtime_fake_executor.rs

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use sitepipe::config::ConfigFile;
use sitepipe::dag::Scheduler;
use sitepipe::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
};
use sitepipe::pipeline::BuildPlan;
use sitepipe::types::TaskId;
use sitepipe_test_utils::fake_executor::executed_ids;
use sitepipe_test_utils::{init_tracing, with_timeout, FakeExecutor, TestResult};

fn core(cfg: &ConfigFile) -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::new(BuildPlan::from_config(cfg).watch_graph()),
        RuntimeOptions {
            exit_when_idle: true,
        },
    )
}

#[tokio::test]
async fn icon_change_rebuilds_sprites_then_styles_only() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::defaults()?;

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed));

    tx.send(RuntimeEvent::TaskTriggered {
        task: TaskId::Sprites,
        reason: TriggerReason::FileWatch,
    })
    .await?;

    with_timeout(Runtime::new(core(&cfg), rx, executor).run()).await?;

    assert_eq!(executed_ids(&executed), vec![TaskId::Sprites, TaskId::Styles]);
    Ok(())
}

#[tokio::test]
async fn template_change_runs_templates_alone() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::defaults()?;

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed));

    tx.send(RuntimeEvent::TaskTriggered {
        task: TaskId::Templates,
        reason: TriggerReason::FileWatch,
    })
    .await?;

    with_timeout(Runtime::new(core(&cfg), rx, executor).run()).await?;

    assert_eq!(executed_ids(&executed), vec![TaskId::Templates]);
    Ok(())
}

#[tokio::test]
async fn failing_sprites_skip_styles_and_runtime_keeps_going() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::defaults()?;

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed)).failing(TaskId::Sprites);

    tx.send(RuntimeEvent::TaskTriggered {
        task: TaskId::Sprites,
        reason: TriggerReason::FileWatch,
    })
    .await?;

    let result = with_timeout(Runtime::new(core(&cfg), rx, executor).run()).await;

    assert!(result.is_ok());
    assert_eq!(executed_ids(&executed), vec![TaskId::Sprites]);
    Ok(())
}

#[tokio::test]
async fn all_tasks_of_one_run_share_a_run_id() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::defaults()?;

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed));

    tx.send(RuntimeEvent::TaskTriggered {
        task: TaskId::Sprites,
        reason: TriggerReason::FileWatch,
    })
    .await?;

    with_timeout(Runtime::new(core(&cfg), rx, executor).run()).await?;

    let runs: Vec<u64> = executed.lock().unwrap().iter().map(|t| t.run_id).collect();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0], runs[1]);
    Ok(())
}
