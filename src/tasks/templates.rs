// src/tasks/templates.rs

//! Page rendering with `minijinja`.
//!
//! The loader is rooted at the views directory so layouts and partials can
//! be pulled in with `{% extends %}` / `{% include %}`. Each page template
//! becomes one `.html` file in the output directory.

use std::path::Path;
use std::sync::Arc;

use minijinja::{context, path_loader, Environment};
use tracing::debug;

use crate::errors::TaskError;
use crate::tasks::files::{expand, write};
use crate::tasks::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskId;

#[derive(Debug)]
pub struct TemplatesTask {
    ctx: Arc<TaskContext>,
}

impl TemplatesTask {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }
}

impl AssetTask for TemplatesTask {
    fn id(&self) -> TaskId {
        TaskId::Templates
    }

    fn watch_patterns(&self) -> Vec<String> {
        self.ctx.config().templates.watch.clone()
    }

    fn run(&self) -> Result<TaskReport, TaskError> {
        let section = &self.ctx.config().templates;
        let views = self.ctx.source(&section.root);

        let mut env = Environment::new();
        env.set_loader(path_loader(&views));

        let mode = match self.ctx.live_reload_port() {
            Some(_) => "dev",
            None => "build",
        };

        let pages = expand(self.ctx.root(), &section.pages)?;
        let dest = self.ctx.output(&section.dest);

        for page in &pages {
            let name = template_name(&views, &page.path)?;
            debug!(template = %name, "rendering page");

            let html = env.get_template(&name)?.render(context! { mode => mode })?;
            let html = match self.ctx.live_reload_port() {
                Some(port) => inject_reload_script(&html, port),
                None => html,
            };

            write(&dest.join(page.rel.with_extension("html")), html)?;
        }

        Ok(TaskReport::new(pages.len()))
    }
}

/// Loader name of a page: its path below the views root, `/`-separated.
fn template_name(views: &Path, page: &Path) -> Result<String, TaskError> {
    let rel = page.strip_prefix(views).map_err(|_| TaskError::Input {
        path: page.display().to_string(),
        message: format!("page is outside the template root {}", views.display()),
    })?;

    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Client side of the live-reload channel.
pub fn reload_script(port: u16) -> String {
    format!(
        r#"<script>
const socket = new WebSocket("ws://" + location.hostname + ":{port}");
socket.addEventListener("message", event => {{
    if (event.data === "reload") window.location.reload();
}});
</script>"#
    )
}

/// Insert the live-reload client before `</body>`, or append it.
pub fn inject_reload_script(html: &str, port: u16) -> String {
    let script = reload_script(port);
    match html.rfind("</body>") {
        Some(idx) => format!("{}{}\n{}", &html[..idx], script, &html[idx..]),
        None => format!("{html}\n{script}"),
    }
}
