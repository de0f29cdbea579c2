//! Integer result codes handed back to host processes.
//!
//! Every operation outcome, success or failure, maps onto one code of a
//! closed set. Codes render as `E0NN` and parse from either that form or
//! the bare number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskgrid_state::StateError;

use crate::error::{SchedulerError, SchedulerResult};

/// Closed set of operation result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(i32)]
pub enum ReturnCode {
    InitSucceeded = 1,
    InvalidThreshold = 2,
    NodeRegistered = 3,
    InvalidNodeId = 4,
    NodeAlreadyRegistered = 5,
    NodeUnregistered = 6,
    NodeNotFound = 7,
    TaskAdded = 8,
    InvalidTaskId = 9,
    TaskAlreadyExists = 10,
    TaskDeleted = 11,
    TaskNotFound = 12,
    ScheduleSucceeded = 13,
    NoSuitableSchedule = 14,
    QuerySucceeded = 15,
    InvalidArgument = 16,
}

impl ReturnCode {
    pub const ALL: [ReturnCode; 16] = [
        ReturnCode::InitSucceeded,
        ReturnCode::InvalidThreshold,
        ReturnCode::NodeRegistered,
        ReturnCode::InvalidNodeId,
        ReturnCode::NodeAlreadyRegistered,
        ReturnCode::NodeUnregistered,
        ReturnCode::NodeNotFound,
        ReturnCode::TaskAdded,
        ReturnCode::InvalidTaskId,
        ReturnCode::TaskAlreadyExists,
        ReturnCode::TaskDeleted,
        ReturnCode::TaskNotFound,
        ReturnCode::ScheduleSucceeded,
        ReturnCode::NoSuitableSchedule,
        ReturnCode::QuerySucceeded,
        ReturnCode::InvalidArgument,
    ];

    /// Numeric value of the code.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Whether this code reports a successful operation.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            ReturnCode::InitSucceeded
                | ReturnCode::NodeRegistered
                | ReturnCode::NodeUnregistered
                | ReturnCode::TaskAdded
                | ReturnCode::TaskDeleted
                | ReturnCode::ScheduleSucceeded
                | ReturnCode::QuerySucceeded
        )
    }

    /// Code for the result of `op`.
    pub fn of<T>(op: Operation, result: &SchedulerResult<T>) -> Self {
        match result {
            Ok(_) => op.success_code(),
            Err(e) => e.into(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ReturnCode::InitSucceeded => "init succeeded",
            ReturnCode::InvalidThreshold => "invalid threshold",
            ReturnCode::NodeRegistered => "node registered",
            ReturnCode::InvalidNodeId => "invalid node id",
            ReturnCode::NodeAlreadyRegistered => "node already registered",
            ReturnCode::NodeUnregistered => "node unregistered",
            ReturnCode::NodeNotFound => "node not found",
            ReturnCode::TaskAdded => "task added",
            ReturnCode::InvalidTaskId => "invalid task id",
            ReturnCode::TaskAlreadyExists => "task already exists",
            ReturnCode::TaskDeleted => "task deleted",
            ReturnCode::TaskNotFound => "task not found",
            ReturnCode::ScheduleSucceeded => "schedule succeeded",
            ReturnCode::NoSuitableSchedule => "no suitable schedule",
            ReturnCode::QuerySucceeded => "query succeeded",
            ReturnCode::InvalidArgument => "invalid argument",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.code())
    }
}

impl FromStr for ReturnCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('E')
            .or_else(|| trimmed.strip_prefix('e'))
            .unwrap_or(trimmed);
        let code: i32 = digits
            .parse()
            .map_err(|_| format!("not a result code: {s:?}"))?;
        Self::from_code(code).ok_or_else(|| format!("unknown result code: {s:?}"))
    }
}

impl TryFrom<String> for ReturnCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReturnCode> for String {
    fn from(code: ReturnCode) -> Self {
        code.to_string()
    }
}

impl From<&StateError> for ReturnCode {
    fn from(err: &StateError) -> Self {
        match err {
            StateError::InvalidNodeId(_) => ReturnCode::InvalidNodeId,
            StateError::NodeAlreadyRegistered(_) => ReturnCode::NodeAlreadyRegistered,
            StateError::NodeNotFound(_) => ReturnCode::NodeNotFound,
            StateError::InvalidTaskId(_) | StateError::InvalidWeight { .. } => {
                ReturnCode::InvalidTaskId
            }
            StateError::TaskAlreadyExists(_) => ReturnCode::TaskAlreadyExists,
            StateError::TaskNotFound(_) => ReturnCode::TaskNotFound,
        }
    }
}

impl From<&SchedulerError> for ReturnCode {
    fn from(err: &SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidThreshold(_) => ReturnCode::InvalidThreshold,
            SchedulerError::NoPendingTasks | SchedulerError::NoSuitableSchedule(_) => {
                ReturnCode::NoSuitableSchedule
            }
            SchedulerError::InvalidArgument(_) => ReturnCode::InvalidArgument,
            SchedulerError::State(e) => e.into(),
        }
    }
}

/// Host-visible operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Init,
    RegisterNode,
    UnregisterNode,
    AddTask,
    DeleteTask,
    Schedule,
    Query,
}

impl Operation {
    pub fn success_code(self) -> ReturnCode {
        match self {
            Operation::Init => ReturnCode::InitSucceeded,
            Operation::RegisterNode => ReturnCode::NodeRegistered,
            Operation::UnregisterNode => ReturnCode::NodeUnregistered,
            Operation::AddTask => ReturnCode::TaskAdded,
            Operation::DeleteTask => ReturnCode::TaskDeleted,
            Operation::Schedule => ReturnCode::ScheduleSucceeded,
            Operation::Query => ReturnCode::QuerySucceeded,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::RegisterNode => "register_node",
            Operation::UnregisterNode => "unregister_node",
            Operation::AddTask => "add_task",
            Operation::DeleteTask => "delete_task",
            Operation::Schedule => "schedule",
            Operation::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
