//! # ADRELAY Dispatch
//!
//! Marshals work from arbitrary threads onto the thread that owns the
//! per-frame update loop.
//!
//! ## Flow
//!
//! ```text
//!   SDK thread ──┐
//!   SDK thread ──┼──> enqueue() ──> [ FIFO ] ──> tick() (owner, 1 per frame)
//!   worker     ──┘                                   │
//!                                                     └─> callback runs on owner
//!
//!   owner thread ──> enqueue() ──> callback runs immediately (queue bypassed)
//! ```
//!
//! ## Rules
//!
//! 1. **One task per tick** - per-frame latency stays bounded
//! 2. **Faults are contained** - a panicking or failing task is logged and
//!    the next tick carries on
//! 3. **No global instance** - construct a [`Dispatcher`] and clone the handle
//!
//! ## Example
//!
//! ```rust
//! use adrelay_dispatch::{Dispatcher, TickOutcome};
//!
//! let dispatcher = Dispatcher::new();
//! let producer = dispatcher.clone();
//! std::thread::spawn(move || producer.enqueue(|| println!("on the main thread")))
//!     .join()
//!     .unwrap();
//!
//! assert_eq!(dispatcher.tick(), TickOutcome::Executed);
//! assert_eq!(dispatcher.tick(), TickOutcome::Idle);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod affinity;
pub mod dispatcher;
pub mod error;
pub mod stats;
pub mod task;

pub use affinity::OwnerThread;
pub use dispatcher::{Dispatcher, DispatcherState, TickOutcome};
pub use error::TaskFault;
pub use stats::DispatchStats;
pub use task::Task;
