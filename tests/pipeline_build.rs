// tests/pipeline_build.rs
//
// Full builds against a sample project on disk. Scripts are left out of the
// default plan here: bundle mode shells out to an external bundler.

use sitepipe::config::ConfigFile;
use sitepipe::errors::{SitepipeError, TaskError};
use sitepipe::pipeline::{run_single, run_stages, BuildPlan};
use sitepipe::types::{ScriptMode, SpriteMode, TaskId};
use sitepipe::watch::compute_hash_for_paths;
use sitepipe_test_utils::fixture::files_under;
use sitepipe_test_utils::{init_tracing, with_timeout, ConfigBuilder, SiteFixture};

fn without_scripts() -> ConfigBuilder {
    ConfigBuilder::new().stages(&[
        &[TaskId::Clean],
        &[TaskId::Sprites],
        &[TaskId::Styles, TaskId::Templates, TaskId::Fonts, TaskId::Images],
    ])
}

async fn build(site: &SiteFixture, cfg: ConfigFile) -> Result<(), SitepipeError> {
    let plan = BuildPlan::from_config(&cfg);
    let tasks = site.tasks(cfg, None);
    with_timeout(run_stages(&plan, &tasks)).await
}

fn output_hash(site: &SiteFixture) -> String {
    compute_hash_for_paths(files_under(&site.path("build"))).unwrap()
}

#[tokio::test]
async fn full_build_produces_the_output_tree() {
    init_tracing();
    let site = SiteFixture::sample();

    build(&site, without_scripts().build()).await.unwrap();

    assert!(site.exists("build/index.html"));
    assert!(site.exists("build/assets/styles/main.min.css"));
    assert!(site.exists("build/assets/images/icons/sprite.svg"));
    assert!(site.exists("build/assets/fonts/inter/inter.woff2"));
    assert!(site.exists("build/assets/images/pictures/dot.png"));

    // The generated partial lives with the style sources, not the output.
    assert!(site.exists("src/assets/styles/common/_sprite.scss"));
}

#[tokio::test]
async fn stylesheet_references_sprite_relative_to_itself() {
    let site = SiteFixture::sample();

    build(&site, without_scripts().build()).await.unwrap();

    let css = site.read("build/assets/styles/main.min.css");
    assert!(css.contains("../images/icons/sprite.svg"), "css was: {css}");
    assert!(css.contains(".icon-home"));
    assert!(css.contains(".icon-search"));
    assert!(css.contains("-16px"));
    assert!(css.contains("#c0ffee"));
}

#[tokio::test]
async fn rebuilding_unchanged_sources_is_idempotent() {
    let site = SiteFixture::sample();

    build(&site, without_scripts().build()).await.unwrap();
    let first = output_hash(&site);
    let partial = site.read("src/assets/styles/common/_sprite.scss");

    build(&site, without_scripts().build()).await.unwrap();

    assert_eq!(first, output_hash(&site));
    assert_eq!(partial, site.read("src/assets/styles/common/_sprite.scss"));
}

#[tokio::test]
async fn clean_removes_stale_output() {
    let site = SiteFixture::sample();
    site.write("build/stale.html", "old");

    build(&site, without_scripts().build()).await.unwrap();

    assert!(!site.exists("build/stale.html"));
    assert!(site.exists("build/index.html"));
}

#[tokio::test]
async fn clean_on_missing_output_is_fine() {
    let site = SiteFixture::empty();
    let cfg = ConfigFile::defaults().unwrap();
    let tasks = site.tasks(cfg, None);

    run_single(TaskId::Clean, &tasks).await.unwrap();
    assert!(!site.exists("build"));
}

#[tokio::test]
async fn style_error_keeps_previous_stylesheet() {
    let site = SiteFixture::sample();
    build(&site, without_scripts().build()).await.unwrap();
    let before = site.read("build/assets/styles/main.min.css");

    site.write("src/assets/styles/main.scss", "body { color: $undefined; }\n");
    let tasks = site.tasks(without_scripts().build(), None);
    let err = run_single(TaskId::Styles, &tasks).await.unwrap_err();

    match err {
        SitepipeError::TaskFailed { task, source } => {
            assert_eq!(task, TaskId::Styles);
            assert!(matches!(source, TaskError::Style(_)));
            assert!(source.is_input_error());
        }
        other => panic!("Expected TaskFailed, got: {other:?}"),
    }
    assert_eq!(before, site.read("build/assets/styles/main.min.css"));
}

#[tokio::test]
async fn missing_stylesheet_entry_is_a_filesystem_error() {
    let site = SiteFixture::empty();
    let tasks = site.tasks(ConfigFile::defaults().unwrap(), None);

    let err = run_single(TaskId::Styles, &tasks).await.unwrap_err();
    assert!(matches!(
        err,
        SitepipeError::TaskFailed { source: TaskError::Io { .. }, .. }
    ));
}

#[tokio::test]
async fn template_error_fails_the_build() {
    let site = SiteFixture::sample();
    site.write("src/views/pages/broken.twig", "{% block %}");

    let err = build(&site, without_scripts().build()).await.unwrap_err();
    assert!(matches!(
        err,
        SitepipeError::TaskFailed { task: TaskId::Templates, source: TaskError::Template(_) }
    ));
}

#[tokio::test]
async fn pages_render_in_build_mode_without_reload_script() {
    let site = SiteFixture::sample();
    build(&site, without_scripts().build()).await.unwrap();

    let html = site.read("build/index.html");
    assert!(html.contains("<h1>Hello (build)</h1>"));
    assert!(!html.contains("WebSocket"));
}

#[tokio::test]
async fn dev_mode_pages_carry_the_reload_script() {
    let site = SiteFixture::sample();
    let tasks = site.tasks(ConfigFile::defaults().unwrap(), Some(40123));

    run_single(TaskId::Templates, &tasks).await.unwrap();

    let html = site.read("build/index.html");
    assert!(html.contains("<h1>Hello (dev)</h1>"));
    assert!(html.contains(":40123"));
    let script = html.find("WebSocket").unwrap();
    assert!(script < html.find("</body>").unwrap());
}

#[tokio::test]
async fn symbol_and_raster_sprites() {
    let site = SiteFixture::sample();
    site.write_png("src/assets/images/icons/logo.png", 10, 4);
    site.write_png("src/assets/images/icons/mark.png", 6, 6);

    let cfg = ConfigBuilder::new()
        .sprite_modes(&[SpriteMode::Symbol, SpriteMode::Raster])
        .build();
    let tasks = site.tasks(cfg, None);
    run_single(TaskId::Sprites, &tasks).await.unwrap();

    let sheet = site.read("build/assets/images/icons/sprite-symbol.svg");
    assert!(sheet.contains(r#"<symbol id="icon-home" viewBox="0 0 16 16">"#));
    assert!(sheet.contains(r#"<symbol id="icon-search" viewBox="0 0 24 24">"#));

    let png = image::open(site.path("build/assets/images/icons/sprite.png")).unwrap();
    assert_eq!((png.width(), png.height()), (10, 10));

    let partial = site.read("src/assets/styles/common/_sprite-png.scss");
    assert!(partial.contains(".icon-png-logo"));
    assert!(partial.contains(".icon-png-mark"));
    assert!(partial.contains("-4px"));
}

#[tokio::test]
async fn broken_icon_fails_sprites() {
    let site = SiteFixture::sample();
    site.write("src/assets/images/icons/bad.svg", "<svg><g/></svg>");
    let tasks = site.tasks(ConfigFile::defaults().unwrap(), None);

    let err = run_single(TaskId::Sprites, &tasks).await.unwrap_err();
    assert!(matches!(
        err,
        SitepipeError::TaskFailed { source: TaskError::Input { .. }, .. }
    ));
}

#[tokio::test]
async fn icon_name_unsafe_for_ids_fails_sprites() {
    let site = SiteFixture::sample();
    site.write("src/assets/images/icons/a&b.svg", sitepipe_test_utils::fixture::HOME_SVG);
    let tasks = site.tasks(ConfigFile::defaults().unwrap(), None);

    let err = run_single(TaskId::Sprites, &tasks).await.unwrap_err();
    match err {
        SitepipeError::TaskFailed {
            source: TaskError::Input { path, message },
            ..
        } => {
            assert!(path.ends_with("a&b.svg"));
            assert!(message.contains("a&b"));
        }
        other => panic!("Expected an input error, got: {other:?}"),
    }
    assert!(!site.exists("build/assets/images/icons/sprite.svg"));
}

#[tokio::test]
async fn images_are_never_larger_than_their_source() {
    let site = SiteFixture::sample();
    site.write("src/assets/images/pictures/notes.txt", "kept as is");
    let tasks = site.tasks(ConfigFile::defaults().unwrap(), None);

    run_single(TaskId::Images, &tasks).await.unwrap();

    let src = std::fs::metadata(site.path("src/assets/images/pictures/dot.png")).unwrap();
    let out = std::fs::metadata(site.path("build/assets/images/pictures/dot.png")).unwrap();
    assert!(out.len() <= src.len());
    image::open(site.path("build/assets/images/pictures/dot.png")).unwrap();
    assert_eq!(site.read("build/assets/images/pictures/notes.txt"), "kept as is");
}

#[tokio::test]
async fn concat_scripts_join_sources_in_order() {
    let site = SiteFixture::empty();
    site.write("src/assets/js/a.js", "var a = 1");
    site.write("src/assets/js/b.js", "var b = 2");

    let mut builder = ConfigBuilder::new();
    builder.raw_mut().scripts.mode = Some(ScriptMode::Concat);
    let tasks = site.tasks(builder.build(), None);

    run_single(TaskId::Scripts, &tasks).await.unwrap();

    assert_eq!(site.read("build/assets/js/app.min.js"), "var a = 1;\nvar b = 2");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_bundler_reports_command_error() {
    let site = SiteFixture::empty();
    let mut builder = ConfigBuilder::new();
    builder.raw_mut().scripts.bundler = "echo broken >&2; exit 3".to_string();
    let tasks = site.tasks(builder.build(), None);

    let err = run_single(TaskId::Scripts, &tasks).await.unwrap_err();
    match err {
        SitepipeError::TaskFailed {
            source: TaskError::Command { message, .. },
            ..
        } => assert!(message.contains("broken")),
        other => panic!("Expected command failure, got: {other:?}"),
    }
}

#[tokio::test]
async fn favicon_files_land_in_output_root() {
    let site = SiteFixture::empty();
    site.write("src/favicon/favicon.ico", "ico");
    site.write("src/favicon/site.webmanifest", "{}");
    let tasks = site.tasks(ConfigBuilder::new().with_favicon().build(), None);

    run_single(TaskId::Favicon, &tasks).await.unwrap();

    assert_eq!(site.read("build/favicon.ico"), "ico");
    assert!(site.exists("build/site.webmanifest"));
}
