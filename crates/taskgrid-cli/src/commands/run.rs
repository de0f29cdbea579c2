//! `taskgrid run` / `taskgrid check`.

use std::path::Path;

use anyhow::bail;
use serde::Serialize;
use tracing::{debug, info, warn};

use taskgrid_scheduler::{Operation, ReturnCode, SchedulerResult, StatusReport, TaskScheduler};
use taskgrid_state::TaskInfo;

use crate::scenario::{Action, PlannedStep, Scenario};

/// Output format for `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepResult {
    pub index: usize,
    pub op: Operation,
    pub args: String,
    pub code: ReturnCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<ReturnCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Records returned by a `query` step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<TaskInfo>>,
}

impl StepResult {
    pub fn matches_expectation(&self) -> bool {
        self.expected.is_none_or(|e| e == self.code)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub steps: Vec<StepResult>,
    /// Steps whose code reports a failed operation.
    pub failed: usize,
    pub mismatches: usize,
    pub status: StatusReport,
}

/// Run every step against a fresh scheduler.
pub fn execute(scenario: &Scenario, steps: &[PlannedStep]) -> RunReport {
    let mut scheduler = TaskScheduler::new();
    let mut results = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        let mut records = None;
        let (code, error) = match step.action {
            Action::Init => {
                scheduler.init();
                (ReturnCode::InitSucceeded, None)
            }
            Action::RegisterNode(n) => outcome(Operation::RegisterNode, scheduler.register_node(n)),
            Action::UnregisterNode(n) => {
                outcome(Operation::UnregisterNode, scheduler.unregister_node(n))
            }
            Action::AddTask(t, w) => outcome(Operation::AddTask, scheduler.add_task(t, w)),
            Action::DeleteTask(t) => outcome(Operation::DeleteTask, scheduler.delete_task(t)),
            Action::Schedule(t) => outcome(Operation::Schedule, scheduler.schedule_tasks(t)),
            Action::Query => {
                let mut out = Vec::new();
                let result = scheduler.query_task_status(&mut out);
                if result.is_ok() {
                    records = Some(out);
                }
                outcome(Operation::Query, result)
            }
        };

        let result = StepResult {
            index: i + 1,
            op: step.action.operation(),
            args: step.action.args(),
            code,
            expected: step.expect,
            error,
            records,
        };
        if result.matches_expectation() {
            debug!(step = result.index, op = %result.op, %code, "step done");
        } else {
            warn!(
                step = result.index,
                op = %result.op,
                %code,
                expected = ?result.expected,
                "step did not match expectation"
            );
        }
        results.push(result);
    }

    let mismatches = results.iter().filter(|r| !r.matches_expectation()).count();
    let failed = results.iter().filter(|r| !r.code.is_success()).count();
    RunReport {
        scenario: scenario.display_name().to_string(),
        steps: results,
        failed,
        mismatches,
        status: scheduler.status_report(),
    }
}

fn outcome<T>(op: Operation, result: SchedulerResult<T>) -> (ReturnCode, Option<String>) {
    let code = ReturnCode::of(op, &result);
    (code, result.err().map(|e| e.to_string()))
}

pub fn format_report(report: &RunReport) -> String {
    let mut out = format!("scenario: {}\n", report.scenario);
    for step in &report.steps {
        let mut line = format!("[{:>3}] {}", step.index, step.op);
        if !step.args.is_empty() {
            line.push(' ');
            line.push_str(&step.args);
        }
        line.push_str(&format!(" -> {} {}", step.code, step.code.description()));
        if let Some(expected) = step.expected.filter(|&e| e != step.code) {
            line.push_str(&format!("  MISMATCH (expected {expected})"));
        }
        if let Some(error) = &step.error {
            line.push_str(&format!("\n        {error}"));
        }
        for record in step.records.iter().flatten() {
            line.push_str(&format!(
                "\n        task {} -> node {}",
                record.task_id, record.node_id
            ));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!(
        "steps: {}  failed: {}  mismatched: {}\n",
        report.steps.len(),
        report.failed,
        report.mismatches
    ));
    out.push_str(&format!("{}\n", report.status));
    out
}

pub fn run(path: &Path, format: Format) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(path)?;
    let steps = scenario.plan()?;
    info!(scenario = scenario.display_name(), steps = steps.len(), "running scenario");

    let report = execute(&scenario, &steps);
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print!("{}", format_report(&report)),
    }

    if report.mismatches > 0 {
        bail!(
            "{} of {} steps did not match their expected result",
            report.mismatches,
            report.steps.len()
        );
    }
    Ok(())
}

pub fn check(path: &Path) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(path)?;
    let steps = scenario.plan()?;
    println!(
        "✓ {}: {} steps, {} with expectations",
        scenario.display_name(),
        steps.len(),
        steps.iter().filter(|s| s.expect.is_some()).count()
    );
    Ok(())
}
