//! Executors that run deferred inspector work.
//!
//! An [`Executor`] accepts a [`Task`] and promises to run it eventually, on
//! some thread, in submission order relative to other tasks it was given.
//! Whether a task runs inline, on a pumped queue or on a tokio task is up to
//! the implementation:
//!
//! - [`QueuedImmediateExecutor`] runs inline but never re-enters; tasks
//!   submitted while a task is running are queued and drained afterwards.
//! - [`ManualExecutor`] only queues; the host pumps it from its own loop.
//! - [`SerialExecutor`] forwards to a dedicated tokio task.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, trace};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks in submission order.
pub trait Executor: Send + Sync {
	fn execute(&self, task: Task);
}

impl<F> Executor for F
where
	F: Fn(Task) + Send + Sync,
{
	fn execute(&self, task: Task) {
		self(task)
	}
}

/// Shared, type-erased executor handle.
pub type VoidExecutor = Arc<dyn Executor>;

thread_local! {
	static IMMEDIATE_QUEUE: RefCell<Option<VecDeque<Task>>> = const { RefCell::new(None) };
}

/// Runs tasks on the calling thread without ever nesting them.
///
/// The outermost `execute` call runs its task immediately and then drains
/// whatever was submitted meanwhile, so a callback scheduled from inside
/// another callback observes the outer one fully completed.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueuedImmediateExecutor;

impl QueuedImmediateExecutor {
	pub fn new() -> Self {
		Self
	}

	/// Returns this executor as a shared handle.
	pub fn shared() -> VoidExecutor {
		Arc::new(Self)
	}
}

/// Clears the thread's queue even if a task unwinds.
struct DrainGuard;

impl Drop for DrainGuard {
	fn drop(&mut self) {
		IMMEDIATE_QUEUE.with(|queue| queue.borrow_mut().take());
	}
}

impl Executor for QueuedImmediateExecutor {
	fn execute(&self, task: Task) {
		let nested = IMMEDIATE_QUEUE.with(|queue| {
			let mut queue = queue.borrow_mut();
			match queue.as_mut() {
				Some(pending) => {
					pending.push_back(task);
					None
				}
				None => {
					*queue = Some(VecDeque::new());
					Some(task)
				}
			}
		});

		let Some(first) = nested else {
			return;
		};

		let _guard = DrainGuard;
		first();
		while let Some(next) =
			IMMEDIATE_QUEUE.with(|queue| queue.borrow_mut().as_mut().and_then(VecDeque::pop_front))
		{
			next();
		}
	}
}

/// Queues tasks until the host calls [`ManualExecutor::run_until_idle`].
///
/// Suits hosts that already own a thread with a message loop (typically the
/// JavaScript thread) and want inspector work to run there.
#[derive(Default)]
pub struct ManualExecutor {
	queue: Mutex<VecDeque<Task>>,
}

impl ManualExecutor {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Runs queued tasks, including those queued by the tasks themselves,
	/// until the queue is empty. Returns how many ran.
	pub fn run_until_idle(&self) -> usize {
		let mut ran = 0;
		loop {
			// The lock is released before the task runs so it may enqueue more.
			let next = self.queue.lock().pop_front();
			let Some(task) = next else {
				return ran;
			};
			task();
			ran += 1;
		}
	}

	pub fn pending(&self) -> usize {
		self.queue.lock().len()
	}
}

impl Executor for ManualExecutor {
	fn execute(&self, task: Task) {
		self.queue.lock().push_back(task);
	}
}

/// Forwards tasks to a single tokio task that runs them one at a time.
///
/// A panicking task is logged and does not stop the loop. Dropping every
/// handle closes the queue; tasks already queued still run.
#[derive(Clone)]
pub struct SerialExecutor {
	tx: mpsc::UnboundedSender<Task>,
}

impl SerialExecutor {
	/// Starts the worker on the current tokio runtime.
	///
	/// # Panics
	///
	/// Panics if called outside a tokio runtime.
	pub fn spawn() -> Self {
		Self::spawn_on(&Handle::current())
	}

	/// Starts the worker on the given runtime.
	pub fn spawn_on(handle: &Handle) -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
		handle.spawn(async move {
			while let Some(task) = rx.recv().await {
				if catch_unwind(AssertUnwindSafe(task)).is_err() {
					error!("Executor task panicked");
				}
			}
			trace!("Serial executor stopped");
		});
		Self { tx }
	}

	pub fn shared(self) -> VoidExecutor {
		Arc::new(self)
	}
}

impl Executor for SerialExecutor {
	fn execute(&self, task: Task) {
		if self.tx.send(task).is_err() {
			trace!("Serial executor closed, dropping task");
		}
	}
}

#[cfg(test)]
mod tests;
