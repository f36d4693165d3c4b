//! Cooperative scheduler
//!
//! A single-threaded FIFO of continuations. Work queued here runs "soon, but
//! not now": after the current synchronous turn completes and before the host
//! processes its next external event, which the host models by calling
//! [`Scheduler::run_until_idle`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::config::PipelineConfig;

/// A queued continuation
pub type Task = Box<dyn FnOnce()>;

struct QueuedTask {
    seq: u64,
    label: &'static str,
    task: Task,
}

struct TaskQueue {
    tasks: VecDeque<QueuedTask>,
    next_seq: u64,
    max_tasks_per_drain: usize,
}

/// Handle to a cooperative task queue. Clones share the same queue.
#[derive(Clone)]
pub struct Scheduler {
    queue: Rc<RefCell<TaskQueue>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(&PipelineConfig::default())
    }

    /// Create a scheduler bounded by `config.max_tasks_per_drain`.
    ///
    /// An invalid config is logged and its bound raised to 1.
    pub fn with_config(config: &PipelineConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("{err}; using a drain bound of 1");
        }
        Self {
            queue: Rc::new(RefCell::new(TaskQueue {
                tasks: VecDeque::new(),
                next_seq: 0,
                max_tasks_per_drain: config.max_tasks_per_drain.max(1),
            })),
        }
    }

    /// Upper bound on tasks run by one [`run_until_idle`](Self::run_until_idle)
    pub fn max_tasks_per_drain(&self) -> usize {
        self.queue.borrow().max_tasks_per_drain
    }

    /// Enqueue a continuation. It never runs synchronously inside this call.
    pub fn queue<F: FnOnce() + 'static>(&self, label: &'static str, task: F) {
        let mut queue = self.queue.borrow_mut();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        trace!(seq, label, "queue task");
        queue.tasks.push_back(QueuedTask {
            seq,
            label,
            task: Box::new(task),
        });
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.queue.borrow().tasks.len()
    }

    /// Check if no tasks are waiting
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().tasks.is_empty()
    }

    /// Run the oldest queued task, if any
    pub fn run_next(&self) -> bool {
        // The borrow must end before the task runs: tasks routinely queue more work.
        let next = self.queue.borrow_mut().tasks.pop_front();
        match next {
            Some(QueuedTask { seq, label, task }) => {
                trace!(seq, label, "run task");
                task();
                true
            }
            None => false,
        }
    }

    /// Drain the queue, including tasks queued by tasks that run during the drain.
    ///
    /// Returns the number of tasks executed. A drain stops early once it has
    /// run `max_tasks_per_drain` tasks; the rest stay queued.
    pub fn run_until_idle(&self) -> usize {
        let limit = self.queue.borrow().max_tasks_per_drain;
        let mut ran = 0;
        while ran < limit {
            if !self.run_next() {
                return ran;
            }
            ran += 1;
        }
        if !self.is_idle() {
            warn!(
                limit,
                pending = self.pending(),
                "Scheduler drain stopped at its task limit; work keeps re-scheduling itself"
            );
        }
        ran
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("max_tasks_per_drain", &self.max_tasks_per_drain())
            .finish()
    }
}
