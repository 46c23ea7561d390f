// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::dag::Scheduler;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::RealExecutorBackend;
use crate::pipeline::{run_single, run_stages, BuildPlan};
use crate::serve::LiveReload;
use crate::tasks::TaskSet;
use crate::watch::{build_bindings, spawn_watcher, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the full build (stage runner)
/// - in `dev` mode: live reload, HTTP server, file watcher and the rebuild
///   runtime with its executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = Arc::new(load_or_default(&args.config)?);
    let root = project_root(&args.config)?;
    let plan = BuildPlan::from_config(&cfg);
    let command = args.command();

    if args.dry_run {
        print_dry_run(&cfg, &plan, &root)?;
        return Ok(());
    }

    match command {
        Command::Build => {
            let tasks = TaskSet::from_config(cfg, &root, None);
            run_stages(&plan, &tasks).await?;
        }
        Command::Run { task } => {
            let tasks = TaskSet::from_config(cfg, &root, None);
            let report = run_single(task, &tasks).await?;
            println!("[sitepipe] {task}: {} file(s) written", report.outputs);
        }
        Command::Dev => run_dev(cfg, root, plan).await?,
    }
    Ok(())
}

/// Full build, then serve + watch until Ctrl-C.
async fn run_dev(cfg: Arc<ConfigFile>, root: PathBuf, plan: BuildPlan) -> Result<()> {
    let server = &cfg.server;
    let (reload_listener, reload_port) =
        serve::reserve_port(&server.host, server.live_reload_port)
            .context("binding live-reload port")?;

    let tasks = TaskSet::from_config(Arc::clone(&cfg), &root, Some(reload_port));
    run_stages(&plan, &tasks).await?;

    // Only serve a complete output tree.
    let out_dir = root.join(&cfg.output.dir);
    let live_reload = LiveReload::start(reload_listener)?;
    let debounce = Duration::from_millis(cfg.watch.debounce_ms);
    let _output_watcher = serve::reload::watch_output(&out_dir, debounce, live_reload.trigger())?;

    let listener = serve::http::bind(&server.host, server.port).await?;
    tokio::spawn(async move {
        if let Err(err) = serve::http::serve_dir(listener, out_dir).await {
            tracing::error!(error = %err, "HTTP server stopped");
        }
    });

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let graph = plan.watch_graph();
    let bindings = build_bindings(&tasks)?;
    let _watcher = spawn_watcher(
        &root,
        bindings,
        graph.clone(),
        rt_tx.clone(),
        WatchOptions {
            debounce,
            use_hash: cfg.watch.use_hash,
        },
    )?;

    let executor = RealExecutorBackend::new(tasks, rt_tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(Scheduler::new(graph), RuntimeOptions::default());

    info!(live_reload_port = live_reload.port(), "development mode ready");
    Runtime::new(core, rt_rx, executor).run().await?;
    Ok(())
}

/// The directory holding the config file, made absolute.
///
/// A bare filename like "Sitepipe.toml" (parent = "") resolves to the
/// current working directory.
pub fn project_root(config_path: &Path) -> Result<PathBuf> {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    dir.canonicalize()
        .with_context(|| format!("resolving project root {}", dir.display()))
}

/// Print the build plan and the watch binding table.
fn print_dry_run(cfg: &Arc<ConfigFile>, plan: &BuildPlan, root: &Path) -> Result<()> {
    println!("sitepipe dry-run");
    println!("  root = {}", root.display());
    println!("  variant = {:?}", cfg.variant);
    println!("  output = {}", cfg.output.dir);
    println!(
        "  server = http://{}:{} (live reload on {})",
        cfg.server.host, cfg.server.port, cfg.server.live_reload_port
    );
    println!();

    println!("build plan:");
    print!("{plan}");
    println!();

    let tasks = TaskSet::from_config(Arc::clone(cfg), root, None);
    let bindings = build_bindings(&tasks)?;
    println!("watch bindings ({}):", bindings.len());
    for binding in &bindings {
        println!("  - {}", binding.task());
        println!("      watch: {:?}", binding.watch_patterns());
        if !binding.exclude_patterns().is_empty() {
            println!("      exclude: {:?}", binding.exclude_patterns());
        }
        let dependents = plan.watch_graph().downstream_of(binding.task());
        if dependents.len() > 1 {
            let names: Vec<&str> = dependents[1..].iter().map(|t| t.as_str()).collect();
            println!("      then: {}", names.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
