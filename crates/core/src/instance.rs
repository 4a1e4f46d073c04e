//! Instance targets: one logical application instance within a page.
//!
//! An instance owns at most one [`RuntimeTarget`] at a time. A JavaScript
//! reload is modelled as unregistering the runtime (or the whole instance)
//! and registering a fresh one, never as mutation in place.

use std::fmt;
use std::sync::{Arc, Weak};

use jsinspector_runtime::{Scope, VoidExecutor};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::delegate::{InstanceTargetDelegate, RuntimeTargetDelegate};
use crate::error::{Error, Result};
use crate::page::PageTarget;
use crate::runtime::RuntimeTarget;
use crate::target::{TargetId, TargetKind};

/// A registered application instance.
pub struct InstanceTarget {
	id: TargetId,
	delegate: Box<dyn InstanceTargetDelegate>,
	page: Weak<PageTarget>,
	weak_self: Weak<InstanceTarget>,
	scope: Scope,
	runtime: Mutex<Option<Arc<RuntimeTarget>>>,
}

impl InstanceTarget {
	pub(crate) fn new(delegate: Box<dyn InstanceTargetDelegate>, page: Weak<PageTarget>) -> Arc<Self> {
		Arc::new_cyclic(|weak| Self {
			id: TargetId::next(),
			delegate,
			page,
			weak_self: Weak::clone(weak),
			scope: Scope::new(),
			runtime: Mutex::new(None),
		})
	}

	pub fn id(&self) -> TargetId {
		self.id
	}

	pub fn delegate(&self) -> &dyn InstanceTargetDelegate {
		self.delegate.as_ref()
	}

	pub fn page(&self) -> Option<Arc<PageTarget>> {
		self.page.upgrade()
	}

	/// Registers the instance's JavaScript runtime.
	///
	/// `executor` runs work that must happen on the runtime's thread. Fails
	/// with [`Error::RuntimeAlreadyRegistered`] while another runtime is live;
	/// the existing runtime is left untouched.
	pub fn register_runtime(
		&self,
		delegate: Box<dyn RuntimeTargetDelegate>,
		executor: VoidExecutor,
	) -> Result<Arc<RuntimeTarget>> {
		if !self.is_registered() {
			return Err(Error::NotRegistered {
				kind: TargetKind::Instance,
				id: self.id,
			});
		}

		let runtime = {
			let mut slot = self.runtime.lock();
			if let Some(existing) = slot.as_ref() {
				error!(
					instance = %self.id,
					runtime = %existing.id(),
					"Second runtime registered while one is live"
				);
				return Err(Error::RuntimeAlreadyRegistered {
					instance: self.id,
					runtime: existing.id(),
				});
			}
			let runtime = RuntimeTarget::new(delegate, executor, Weak::clone(&self.weak_self));
			*slot = Some(Arc::clone(&runtime));
			runtime
		};

		debug!(instance = %self.id, runtime = %runtime.id(), "Runtime registered");
		self.notify_page();
		Ok(runtime)
	}

	/// Unregisters `runtime`, cancelling any work still scheduled for it.
	pub fn unregister_runtime(&self, runtime: &Arc<RuntimeTarget>) -> Result<()> {
		let removed = {
			let mut slot = self.runtime.lock();
			match slot.as_ref() {
				Some(current) if Arc::ptr_eq(current, runtime) => slot.take(),
				_ => None,
			}
		};
		let Some(runtime) = removed else {
			return Err(Error::NotRegistered {
				kind: TargetKind::Runtime,
				id: runtime.id(),
			});
		};

		runtime.detach();
		debug!(instance = %self.id, runtime = %runtime.id(), "Runtime unregistered");
		self.notify_page();
		Ok(())
	}

	pub fn current_runtime(&self) -> Option<Arc<RuntimeTarget>> {
		self.runtime.lock().clone()
	}

	/// False once the page has unregistered this instance.
	pub fn is_registered(&self) -> bool {
		!self.scope.is_cancelled()
	}

	/// Drops the live runtime, then ends this instance's scope.
	pub(crate) fn detach(&self) {
		if let Some(runtime) = self.runtime.lock().take() {
			runtime.detach();
			debug!(instance = %self.id, runtime = %runtime.id(), "Runtime detached with instance");
		}
		self.scope.cancel();
	}

	fn notify_page(&self) {
		if let Some(page) = self.page.upgrade() {
			page.notify_session();
		}
	}
}

impl fmt::Debug for InstanceTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InstanceTarget")
			.field("id", &self.id)
			.field("registered", &self.is_registered())
			.field("runtime", &self.current_runtime().map(|r| r.id()))
			.finish()
	}
}
