//! Slotkit Core Runtime
//!
//! This crate provides the foundational primitives for Slotkit components:
//!
//! - **Scheduler**: An explicit cooperative task queue standing in for the host's microtask queue
//! - **State**: Immutable key/value component state, replaced on every update
//! - **Reactive Core**: Merge-based state updates batched into one render per scheduling boundary
//!
//! # Example
//!
//! ```rust
//! use slotkit_core::{ReactiveCore, Scheduler, State, StatePatch};
//!
//! let scheduler = Scheduler::new();
//! let core = ReactiveCore::new(scheduler.clone(), State::default());
//!
//! core.set_state(StatePatch::new().set("a", 1));
//! core.set_state(StatePatch::new().set("b", 2));
//!
//! // Nothing renders until the scheduler reaches a boundary
//! assert_eq!(core.render_count(), 0);
//! scheduler.run_until_idle();
//! assert_eq!(core.render_count(), 1);
//! assert_eq!(core.state().get_as::<i64>("b"), Some(2));
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod scheduler;
pub mod state;

pub use config::PipelineConfig;
pub use error::{ConfigError, PipelineWarning, Result};
pub use reactive::{ChangeListener, ReactiveCore, RenderHooks, StateChange};
pub use scheduler::{Scheduler, Task};
pub use state::{ChangedKeys, State, StatePatch, Value};
