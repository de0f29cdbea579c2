//! taskgrid-scheduler: balanced task placement over registered nodes.
//!
//! Wraps a `TaskStore` (from `taskgrid-state`) and computes task → node
//! assignments that keep every pair of nodes within a load threshold.
//! The scheduler:
//!
//! - Places pending tasks heaviest-first on the least-loaded node
//! - Re-checks balance after every single placement and bails on the first
//!   violation, leaving committed state untouched
//! - Commits a fully successful run atomically
//! - Reports task status sorted by task id, pending tasks on node `-1`
//!
//! # Architecture
//!
//! ```text
//! SharedScheduler (Arc<Mutex<_>>)
//!   └── TaskScheduler
//!       ├── TaskStore (nodes, pending queue, committed assignments)
//!       ├── LoadTable (cached per-node loads during a run)
//!       └── evaluate() (threshold balance check)
//! ```

pub mod balance;
pub mod codes;
pub mod error;
pub mod report;
pub mod scheduler;
pub mod shared;

pub use balance::{Balance, LoadTable, evaluate};
pub use codes::{Operation, ReturnCode};
pub use error::{Infeasibility, SchedulerError, SchedulerResult};
pub use report::{NodeLoad, StatusReport, collect_status};
pub use scheduler::{SchedulePlan, TaskScheduler};
pub use shared::SharedScheduler;
