// tests/watch_triggers.rs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use sitepipe::config::ConfigFile;
use sitepipe::engine::{RuntimeEvent, TriggerReason};
use sitepipe::pipeline::BuildPlan;
use sitepipe::types::{TaskId, Variant};
use sitepipe::watch::event_handler::{prime_hashes, process_file_change};
use sitepipe::watch::patterns::{collapse_watch_roots, nearest_existing_dir};
use sitepipe::watch::{build_bindings, spawn_watcher, ContentHashes, WatchBinding, WatchOptions};
use sitepipe_test_utils::{init_tracing, with_timeout, ConfigBuilder, SiteFixture, TestResult};

fn bindings_for(site: &SiteFixture, cfg: ConfigFile) -> Arc<Vec<WatchBinding>> {
    let tasks = site.tasks(cfg, None);
    Arc::new(build_bindings(&tasks).unwrap())
}

async fn triggered_by(site: &SiteFixture, cfg: ConfigFile, rel: &str) -> Vec<TaskId> {
    let graph = BuildPlan::from_config(&cfg).watch_graph();
    let bindings = bindings_for(site, cfg);
    let (tx, _rx) = mpsc::channel(16);

    process_file_change(&site.root(), &site.path(rel), &bindings, &graph, &tx, None).await
}

#[test]
fn every_task_but_clean_gets_a_binding() {
    let site = SiteFixture::empty();
    let bindings = bindings_for(&site, ConfigFile::defaults().unwrap());

    let tasks: Vec<TaskId> = bindings.iter().map(|b| b.task()).collect();
    assert!(!tasks.contains(&TaskId::Clean));
    assert_eq!(tasks.len(), 6);
}

#[tokio::test]
async fn icon_change_triggers_sprites_only() {
    let site = SiteFixture::sample();
    let cfg = ConfigFile::defaults().unwrap();

    let triggered = triggered_by(&site, cfg, "src/assets/images/icons/home.svg").await;
    assert_eq!(triggered, vec![TaskId::Sprites]);
}

#[tokio::test]
async fn each_source_kind_maps_to_its_task() {
    let site = SiteFixture::sample();
    let cases = [
        ("src/assets/styles/main.scss", TaskId::Styles),
        ("src/assets/styles/components/_button.scss", TaskId::Styles),
        ("src/views/layout.twig", TaskId::Templates),
        ("src/views/pages/index.twig", TaskId::Templates),
        ("src/assets/js/app.js", TaskId::Scripts),
        ("src/assets/fonts/inter/inter.woff2", TaskId::Fonts),
        ("src/assets/images/pictures/dot.png", TaskId::Images),
    ];

    for (rel, task) in cases {
        let triggered = triggered_by(&site, ConfigFile::defaults().unwrap(), rel).await;
        assert_eq!(triggered, vec![task], "change to {rel}");
    }
}

#[tokio::test]
async fn generated_sprite_partial_does_not_trigger_styles() {
    let site = SiteFixture::sample();

    let triggered = triggered_by(
        &site,
        ConfigFile::defaults().unwrap(),
        "src/assets/styles/common/_sprite.scss",
    )
    .await;
    assert!(triggered.is_empty());
}

#[tokio::test]
async fn unrelated_paths_trigger_nothing() {
    let site = SiteFixture::sample();

    for rel in ["README.md", "build/index.html", "src/assets/images/icons/nested/a.svg"] {
        let triggered = triggered_by(&site, ConfigFile::defaults().unwrap(), rel).await;
        assert!(triggered.is_empty(), "change to {rel}");
    }
}

#[tokio::test]
async fn png_icons_feed_sprites_in_concat_variant() {
    let site = SiteFixture::sample();
    let cfg = ConfigBuilder::new().variant(Variant::Concat).build();

    let triggered = triggered_by(&site, cfg, "src/assets/images/icons/logo.png").await;
    assert_eq!(triggered, vec![TaskId::Sprites]);
}

#[tokio::test]
async fn triggers_are_sent_to_the_runtime() {
    let site = SiteFixture::sample();
    let cfg = ConfigFile::defaults().unwrap();
    let graph = BuildPlan::from_config(&cfg).watch_graph();
    let bindings = bindings_for(&site, cfg);
    let (tx, mut rx) = mpsc::channel(16);

    process_file_change(
        &site.root(),
        &site.path("src/views/pages/index.twig"),
        &bindings,
        &graph,
        &tx,
        None,
    )
    .await;

    match rx.recv().await {
        Some(RuntimeEvent::TaskTriggered { task, reason }) => {
            assert_eq!(task, TaskId::Templates);
            assert_eq!(reason, TriggerReason::FileWatch);
        }
        other => panic!("Expected TaskTriggered, got: {other:?}"),
    }
}

#[tokio::test]
async fn unchanged_content_is_skipped_with_hashing() {
    let site = SiteFixture::sample();
    let cfg = ConfigFile::defaults().unwrap();
    let graph = BuildPlan::from_config(&cfg).watch_graph();
    let bindings = bindings_for(&site, cfg);
    let (tx, _rx) = mpsc::channel(16);

    let mut store = ContentHashes::new();
    prime_hashes(&site.root(), &bindings, &mut store);
    let hashes = Some(Arc::new(Mutex::new(store)));

    let path = site.path("src/assets/styles/main.scss");

    // Touch without changing content.
    site.write("src/assets/styles/main.scss", sitepipe_test_utils::fixture::MAIN_SCSS);
    let triggered =
        process_file_change(&site.root(), &path, &bindings, &graph, &tx, hashes.clone()).await;
    assert!(triggered.is_empty());

    site.write("src/assets/styles/main.scss", "body { margin: 0; }\n");
    let triggered =
        process_file_change(&site.root(), &path, &bindings, &graph, &tx, hashes.clone()).await;
    assert_eq!(triggered, vec![TaskId::Styles]);

    // Same content again: skipped.
    let triggered = process_file_change(&site.root(), &path, &bindings, &graph, &tx, hashes).await;
    assert!(triggered.is_empty());
}

#[test]
fn nested_watch_roots_collapse_to_outermost() {
    let collapsed = collapse_watch_roots(vec![
        "/p/src/assets/styles".into(),
        "/p/src/assets".into(),
        "/p/src/views".into(),
        "/p/src/assets/images/icons".into(),
        "/p/src/views".into(),
    ]);

    assert_eq!(
        collapsed,
        vec![
            std::path::PathBuf::from("/p/src/assets"),
            std::path::PathBuf::from("/p/src/views")
        ]
    );
}

#[tokio::test]
async fn filesystem_watcher_reports_icon_change() -> TestResult {
    init_tracing();
    let site = SiteFixture::sample();
    let cfg = ConfigFile::defaults()?;
    let graph = BuildPlan::from_config(&cfg).watch_graph();
    let bindings = build_bindings(&site.tasks(cfg, None))?;
    let (tx, mut rx) = mpsc::channel(16);

    let handle = spawn_watcher(
        site.root(),
        bindings,
        graph,
        tx,
        WatchOptions {
            debounce: Duration::from_millis(50),
            use_hash: false,
        },
    )?;
    // Missing directories (js) are covered by an existing parent.
    assert!(handle.roots().iter().all(|r| r.is_dir()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    site.write(
        "src/assets/images/icons/star.svg",
        sitepipe_test_utils::fixture::HOME_SVG,
    );

    let event = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(RuntimeEvent::TaskTriggered { task, .. }) => break Some(task),
                Some(_) => continue,
                None => break None,
            }
        }
    })
    .await;

    assert_eq!(event, Some(TaskId::Sprites));
    Ok(())
}

#[test]
fn missing_watch_dir_falls_back_to_existing_parent() {
    let site = SiteFixture::sample();
    let root = site.root();

    assert_eq!(
        nearest_existing_dir(&root, &root.join("src/assets/js")),
        root.join("src/assets")
    );
    assert_eq!(
        nearest_existing_dir(&root, &root.join("src/assets/styles")),
        root.join("src/assets/styles")
    );
    assert_eq!(nearest_existing_dir(&root, &root.join("src/favicon/deep")), root.join("src"));
}

#[tokio::test]
async fn directory_created_after_startup_triggers_its_task() -> TestResult {
    init_tracing();
    let site = SiteFixture::sample();
    std::fs::remove_dir_all(site.path("src/assets/fonts"))?;
    let cfg = ConfigFile::defaults()?;
    let graph = BuildPlan::from_config(&cfg).watch_graph();
    let bindings = build_bindings(&site.tasks(cfg, None))?;
    let (tx, mut rx) = mpsc::channel(16);

    let handle = spawn_watcher(
        site.root(),
        bindings,
        graph,
        tx,
        WatchOptions {
            debounce: Duration::from_millis(50),
            use_hash: false,
        },
    )?;
    let fonts_dir = site.path("src/assets/fonts");
    assert!(handle.roots().iter().any(|r| fonts_dir.starts_with(r)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::create_dir_all(&fonts_dir)?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    site.write("src/assets/fonts/new.woff2", b"wOF2");

    let event = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(RuntimeEvent::TaskTriggered { task, .. }) => break Some(task),
                Some(_) => continue,
                None => break None,
            }
        }
    })
    .await;

    assert_eq!(event, Some(TaskId::Fonts));
    Ok(())
}
