//! Lifetime scopes for deferred callbacks.
//!
//! A [`Scope`] is owned by a target. Work scheduled through a
//! [`ScopedExecutor`] captures a [`ScopeToken`] and a weak reference to the
//! target; by the time the task runs, if the scope was cancelled or the target
//! was dropped, the callback is discarded without being invoked.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::executor::{Executor, VoidExecutor};

/// Owning side of a lifetime scope. Cancelled explicitly or on drop.
pub struct Scope {
	live: Arc<AtomicBool>,
}

impl Scope {
	pub fn new() -> Self {
		Self {
			live: Arc::new(AtomicBool::new(true)),
		}
	}

	/// Returns a token observing this scope.
	pub fn token(&self) -> ScopeToken {
		ScopeToken {
			live: Arc::clone(&self.live),
		}
	}

	/// Ends the scope. Returns `true` only for the call that ended it.
	pub fn cancel(&self) -> bool {
		self.live.swap(false, Ordering::AcqRel)
	}

	pub fn is_cancelled(&self) -> bool {
		!self.live.load(Ordering::Acquire)
	}
}

impl Default for Scope {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for Scope {
	fn drop(&mut self) {
		self.cancel();
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scope")
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}

/// Observing side of a [`Scope`].
#[derive(Clone)]
pub struct ScopeToken {
	live: Arc<AtomicBool>,
}

impl ScopeToken {
	pub fn is_live(&self) -> bool {
		self.live.load(Ordering::Acquire)
	}
}

impl fmt::Debug for ScopeToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScopeToken")
			.field("live", &self.is_live())
			.finish()
	}
}

/// Executor whose callbacks run only while their owner is alive.
///
/// The callback receives a borrowed `&T`; the strong reference obtained for
/// the call is released as soon as it returns.
pub struct ScopedExecutor<T: ?Sized> {
	executor: VoidExecutor,
	owner: Weak<T>,
	token: ScopeToken,
}

impl<T: ?Sized> Clone for ScopedExecutor<T> {
	fn clone(&self) -> Self {
		Self {
			executor: Arc::clone(&self.executor),
			owner: Weak::clone(&self.owner),
			token: self.token.clone(),
		}
	}
}

impl<T: ?Sized + Send + Sync + 'static> ScopedExecutor<T> {
	pub fn new(executor: VoidExecutor, owner: Weak<T>, token: ScopeToken) -> Self {
		Self {
			executor,
			owner,
			token,
		}
	}

	/// Schedules `callback` on the underlying executor.
	///
	/// The callback is dropped without running if the scope is cancelled or
	/// the owner is gone when the executor gets to it.
	pub fn execute<F>(&self, callback: F)
	where
		F: FnOnce(&T) + Send + 'static,
	{
		let owner = Weak::clone(&self.owner);
		let token = self.token.clone();
		self.executor.execute(Box::new(move || {
			if !token.is_live() {
				trace!("Dropping callback for cancelled scope");
				return;
			}
			match owner.upgrade() {
				Some(owner) => callback(&*owner),
				None => trace!("Dropping callback for released owner"),
			}
		}));
	}

	/// Returns true while the scope is live and the owner still exists.
	pub fn is_live(&self) -> bool {
		self.token.is_live() && self.owner.strong_count() > 0
	}

	/// Returns the underlying unscoped executor.
	pub fn executor(&self) -> &VoidExecutor {
		&self.executor
	}
}

impl<T: ?Sized> fmt::Debug for ScopedExecutor<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScopedExecutor")
			.field("token", &self.token)
			.field("owner_alive", &(self.owner.strong_count() > 0))
			.finish()
	}
}
