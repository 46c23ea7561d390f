// src/pipeline/plan.rs

use std::collections::BTreeMap;
use std::fmt;

use crate::config::ConfigFile;
use crate::dag::DagGraph;
use crate::types::TaskId;

/// Ordered stages plus explicit `before -> after` ordering constraints.
///
/// Built from a validated [`ConfigFile`], so stage layout and constraints are
/// already known to agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    stages: Vec<Vec<TaskId>>,
    constraints: Vec<(TaskId, TaskId)>,
}

impl BuildPlan {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let constraints = cfg
            .after()
            .iter()
            .flat_map(|(after, befores)| befores.iter().map(move |before| (*before, *after)))
            .collect();

        Self {
            stages: cfg.stages().to_vec(),
            constraints,
        }
    }

    pub fn stages(&self) -> &[Vec<TaskId>] {
        &self.stages
    }

    /// `(before, after)` pairs.
    pub fn constraints(&self) -> &[(TaskId, TaskId)] {
        &self.constraints
    }

    /// Every task of the plan in stage order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.stages.iter().flatten().copied()
    }

    /// Index of the stage containing `task`.
    pub fn stage_of(&self, task: TaskId) -> Option<usize> {
        self.stages.iter().position(|stage| stage.contains(&task))
    }

    /// Ordering graph used for watch rebuilds.
    ///
    /// `clean` is left out: it only ever runs as part of a full build.
    pub fn watch_graph(&self) -> DagGraph {
        let tasks: Vec<TaskId> = self.tasks().filter(|t| *t != TaskId::Clean).collect();

        let mut after: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
        for (before, task) in &self.constraints {
            after.entry(*task).or_default().push(*before);
        }
        DagGraph::new(&tasks, &after)
    }
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, stage) in self.stages.iter().enumerate() {
            let names: Vec<&str> = stage.iter().map(|t| t.as_str()).collect();
            writeln!(f, "  stage {}: {}", idx + 1, names.join(", "))?;
        }
        for (before, after) in &self.constraints {
            writeln!(f, "  constraint: {before} before {after}")?;
        }
        Ok(())
    }
}
