//! Scenario file parser.
//!
//! A scenario is a TOML file listing operations to run against a fresh
//! scheduler, each optionally annotated with the result code it should
//! produce.

use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use taskgrid_scheduler::{Operation, ReturnCode};
use taskgrid_state::{NodeId, TaskId, Threshold, Weight};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub scenario: ScenarioMeta,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Threshold for `schedule` steps that don't set one.
    pub default_threshold: Option<Threshold>,
}

/// One raw step as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub op: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect: Option<ReturnCode>,
}

/// A validated step, ready to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Init,
    RegisterNode(NodeId),
    UnregisterNode(NodeId),
    AddTask(TaskId, Weight),
    DeleteTask(TaskId),
    Schedule(Threshold),
    Query,
}

impl Action {
    pub fn operation(&self) -> Operation {
        match self {
            Action::Init => Operation::Init,
            Action::RegisterNode(_) => Operation::RegisterNode,
            Action::UnregisterNode(_) => Operation::UnregisterNode,
            Action::AddTask(..) => Operation::AddTask,
            Action::DeleteTask(_) => Operation::DeleteTask,
            Action::Schedule(_) => Operation::Schedule,
            Action::Query => Operation::Query,
        }
    }

    /// Arguments rendered as `key=value` pairs.
    pub fn args(&self) -> String {
        match self {
            Action::Init | Action::Query => String::new(),
            Action::RegisterNode(n) | Action::UnregisterNode(n) => format!("node={n}"),
            Action::AddTask(t, w) => format!("task={t} weight={w}"),
            Action::DeleteTask(t) => format!("task={t}"),
            Action::Schedule(t) => format!("threshold={t}"),
        }
    }
}

/// A step after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStep {
    pub action: Action,
    pub expect: Option<ReturnCode>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn display_name(&self) -> &str {
        self.scenario.name.as_deref().unwrap_or("unnamed scenario")
    }

    /// Check every step carries the arguments its operation needs.
    pub fn plan(&self) -> anyhow::Result<Vec<PlannedStep>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let action = self
                    .resolve(step)
                    .with_context(|| format!("step {} ({})", i + 1, step.op))?;
                Ok(PlannedStep {
                    action,
                    expect: step.expect,
                })
            })
            .collect()
    }

    fn resolve(&self, step: &Step) -> anyhow::Result<Action> {
        let unexpected = |name: &str, present: bool| -> anyhow::Result<()> {
            if present {
                bail!("`{name}` is not used by this operation");
            }
            Ok(())
        };
        let node = || step.node.context("missing `node`");
        let task = || step.task.context("missing `task`");

        let action = match step.op {
            Operation::Init => Action::Init,
            Operation::Query => Action::Query,
            Operation::RegisterNode => Action::RegisterNode(node()?),
            Operation::UnregisterNode => Action::UnregisterNode(node()?),
            Operation::AddTask => Action::AddTask(task()?, step.weight.context("missing `weight`")?),
            Operation::DeleteTask => Action::DeleteTask(task()?),
            Operation::Schedule => Action::Schedule(
                step.threshold
                    .or(self.scenario.default_threshold)
                    .context("missing `threshold` and no `default_threshold` set")?,
            ),
        };

        let op = step.op;
        unexpected(
            "node",
            step.node.is_some()
                && !matches!(op, Operation::RegisterNode | Operation::UnregisterNode),
        )?;
        unexpected(
            "task",
            step.task.is_some() && !matches!(op, Operation::AddTask | Operation::DeleteTask),
        )?;
        unexpected("weight", step.weight.is_some() && op != Operation::AddTask)?;
        unexpected("threshold", step.threshold.is_some() && op != Operation::Schedule)?;

        Ok(action)
    }

    /// Example scenario covering every operation.
    pub fn scaffold() -> Self {
        let step = |op, node, task, weight, threshold, expect| Step {
            op,
            node,
            task,
            weight,
            threshold,
            expect: Some(expect),
        };
        Scenario {
            scenario: ScenarioMeta {
                name: Some("two nodes".to_string()),
                description: Some("three equal tasks spread over two nodes".to_string()),
                default_threshold: Some(5),
            },
            steps: vec![
                step(Operation::Init, None, None, None, None, ReturnCode::InitSucceeded),
                step(Operation::RegisterNode, Some(1), None, None, None, ReturnCode::NodeRegistered),
                step(Operation::RegisterNode, Some(2), None, None, None, ReturnCode::NodeRegistered),
                step(Operation::AddTask, None, Some(10), Some(5), None, ReturnCode::TaskAdded),
                step(Operation::AddTask, None, Some(20), Some(5), None, ReturnCode::TaskAdded),
                step(Operation::AddTask, None, Some(30), Some(5), None, ReturnCode::TaskAdded),
                step(Operation::Schedule, None, None, None, None, ReturnCode::ScheduleSucceeded),
                step(Operation::Query, None, None, None, None, ReturnCode::QuerySucceeded),
            ],
        }
    }
}
