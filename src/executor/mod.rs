//! Bounded Job Executor Module
//!
//! Runs every probe worker of a cycle concurrently, each under a hard deadline.
//!
//! ## Execution Model
//! 1. **Registration**: A `BoundedJob` registers itself as a barrier party when it is built,
//!    so the barrier cannot complete before the job has had its chance to run.
//! 2. **First Pass**: The worker's first pass runs in its own task while
//!    `tokio::time::timeout_at` watches the deadline. On overrun the task is aborted.
//! 3. **Arrival**: The job arrives at the barrier exactly once, right after the first pass
//!    or, if the pool cancels it first, from a drop guard.
//! 4. **Extra Passes**: A job whose first pass succeeded keeps probing, one interval apart,
//!    until the barrier terminates or its deadline passes.
//! 5. **Shutdown**: `JobExecutor::shutdown` drains the pool for a grace period, then aborts
//!    whatever is left.
//!
//! ## Submodules
//! - **`types`**: Job statuses and reports.
//! - **`job`**: The deadline wrapper around one worker round.
//! - **`executor`**: The fixed-size pool owned by one cycle.

pub mod executor;
pub mod job;
pub mod types;
