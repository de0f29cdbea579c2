//! taskgrid-state: in-memory registry and assignment store for TaskGrid.
//!
//! Holds the registered worker nodes, the pending task queue and the
//! committed task → node assignments produced by the scheduler.
//!
//! # Architecture
//!
//! ```text
//! TaskStore
//!   ├── nodes        (ascending node ids)
//!   ├── pending      (descending weight, then insertion order)
//!   ├── weights      (every known task, pending or assigned)
//!   └── assignments  (node id → ordered task ids, committed only)
//! ```
//!
//! The store is a plain owned value. Callers that need shared access wrap
//! it (see `taskgrid-scheduler::SharedScheduler`).

pub mod error;
pub mod store;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::TaskStore;
pub use types::*;
