//! Core systems for UltraCanvas.
//!
//! This crate provides the foundation shared by the render and UI crates:
//!
//! - **Errors**: [`CoreError`] and the crate [`Result`] alias
//! - **Logging**: `tracing` targets, span names, [`PerfSpan`] and tree dumps
//! - **Clocks**: [`MonotonicClock`] for real time, [`ManualClock`] for tests
//! - **Timers**: one-shot and repeating timers driven by a clock reading
//! - **Signals**: [`Signal<Args>`] for user callbacks
//! - **Task queue**: posting work from any thread onto the UI thread
//!
//! # Timer Example
//!
//! ```
//! use std::time::Duration;
//! use ultracanvas_core::{Clock, ManualClock, TimerManager};
//!
//! let clock = ManualClock::new();
//! let mut timers = TimerManager::new();
//! let id = timers.start_one_shot(clock.now(), Duration::from_millis(800));
//!
//! clock.advance(Duration::from_millis(800));
//! assert_eq!(timers.process_expired(clock.now()), vec![id]);
//! ```

mod clock;
mod error;
pub mod logging;
pub mod signal;
mod task;
mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use error::{CoreError, Result, SignalError, TimerError};
pub use logging::{PerfSpan, TreeFormatOptions, TreeFormatter, TreeStyle};
pub use signal::{ConnectionId, Signal};
pub use task::{TaskId, TaskQueue, TaskSender};
pub use timer::{TimerId, TimerKind, TimerManager};
