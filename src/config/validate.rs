// src/config/validate.rs

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitepipeError};
use crate::types::{TaskId, Variant};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let has_favicon = raw.favicon.is_some() || raw.pipeline.variant == Variant::Concat;

        let stages = raw
            .pipeline
            .stages
            .clone()
            .unwrap_or_else(|| default_stages(has_favicon));
        let after = match raw.pipeline.after.clone() {
            Some(after) => after,
            None => default_after(&stages),
        };

        validate_global_config(&raw)?;
        validate_stages(&stages, has_favicon)?;
        validate_dag(&after)?;
        validate_constraints(&stages, &after)?;

        Ok(ConfigFile::new_unchecked(raw, stages, after))
    }
}

/// `clean -> sprites -> [favicon] -> everything else`.
fn default_stages(has_favicon: bool) -> Vec<Vec<TaskId>> {
    let mut stages = vec![vec![TaskId::Clean], vec![TaskId::Sprites]];
    if has_favicon {
        stages.push(vec![TaskId::Favicon]);
    }
    stages.push(vec![
        TaskId::Styles,
        TaskId::Templates,
        TaskId::Scripts,
        TaskId::Fonts,
        TaskId::Images,
    ]);
    stages
}

/// Sprite partials are a style source, so styles wait for sprites whenever
/// both are staged.
fn default_after(stages: &[Vec<TaskId>]) -> BTreeMap<TaskId, Vec<TaskId>> {
    let staged = |t: TaskId| stages.iter().any(|s| s.contains(&t));
    if staged(TaskId::Styles) && staged(TaskId::Sprites) {
        BTreeMap::from([(TaskId::Styles, vec![TaskId::Sprites])])
    } else {
        BTreeMap::new()
    }
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    validate_output_dir(&cfg.output.dir)?;

    if !(1..=100).contains(&cfg.images.jpeg_quality) {
        return Err(SitepipeError::ConfigError(format!(
            "[images].jpeg_quality must be within 1..=100 (got {})",
            cfg.images.jpeg_quality
        )));
    }

    if cfg.sprites.modes.as_ref().is_some_and(|m| m.is_empty()) {
        return Err(SitepipeError::ConfigError(
            "[sprites].modes must list at least one mode".to_string(),
        ));
    }

    Ok(())
}

/// The output directory is deleted wholesale, so it must be a plain relative
/// subdirectory of the project root.
fn validate_output_dir(dir: &str) -> Result<()> {
    let path = Path::new(dir);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    if dir.trim().is_empty() || !plain {
        return Err(SitepipeError::ConfigError(format!(
            "[output].dir must be a relative subdirectory of the project root (got {dir:?})"
        )));
    }
    Ok(())
}

fn validate_stages(stages: &[Vec<TaskId>], has_favicon: bool) -> Result<()> {
    if stages.iter().all(|s| s.is_empty()) {
        return Err(SitepipeError::ConfigError(
            "[pipeline].stages must contain at least one task".to_string(),
        ));
    }

    let mut seen: HashMap<TaskId, usize> = HashMap::new();
    for (index, stage) in stages.iter().enumerate() {
        for task in stage {
            if let Some(prev) = seen.insert(*task, index) {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{task}' appears in stage {prev} and again in stage {index}"
                )));
            }
        }
    }

    if let Some(&index) = seen.get(&TaskId::Clean) {
        if index != 0 || stages[0].len() != 1 {
            return Err(SitepipeError::ConfigError(
                "task 'clean' must be alone in the first stage".to_string(),
            ));
        }
    }

    if seen.contains_key(&TaskId::Favicon) && !has_favicon {
        return Err(SitepipeError::ConfigError(
            "task 'favicon' is staged but there is no [favicon] section".to_string(),
        ));
    }

    Ok(())
}

fn validate_constraints(
    stages: &[Vec<TaskId>],
    after: &BTreeMap<TaskId, Vec<TaskId>>,
) -> Result<()> {
    let stage_of: HashMap<TaskId, usize> = stages
        .iter()
        .enumerate()
        .flat_map(|(index, stage)| stage.iter().map(move |t| (*t, index)))
        .collect();

    for (task, deps) in after.iter() {
        let Some(&task_stage) = stage_of.get(task) else {
            return Err(SitepipeError::ConfigError(format!(
                "ordering constraint names task '{task}' which is not in any stage"
            )));
        };

        for dep in deps {
            if dep == task {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{task}' cannot be ordered after itself"
                )));
            }
            let Some(&dep_stage) = stage_of.get(dep) else {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{task}' has unknown dependency '{dep}' in `after`"
                )));
            };
            if dep_stage >= task_stage {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{task}' must run after '{dep}', but is staged at {task_stage} (dependency at {dep_stage})"
                )));
            }
        }
    }

    Ok(())
}

fn validate_dag(after: &BTreeMap<TaskId, Vec<TaskId>>) -> Result<()> {
    // Edge direction: dep -> task
    // For `styles = ["sprites"]` we add edge sprites -> styles.
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for (task, deps) in after.iter() {
        graph.add_node(*task);
        for dep in deps {
            graph.add_edge(*dep, *task, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SitepipeError::DagCycle(format!(
            "cycle detected in ordering constraints involving task '{}'",
            cycle.node_id()
        ))),
    }
}
