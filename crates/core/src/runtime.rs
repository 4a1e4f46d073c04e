//! Runtime targets: one live JavaScript runtime inside an instance.

use std::fmt;
use std::sync::{Arc, Weak};

use jsinspector_runtime::{Scope, ScopedExecutor, VoidExecutor};

use crate::delegate::RuntimeTargetDelegate;
use crate::instance::InstanceTarget;
use crate::target::TargetId;

/// A registered JavaScript runtime.
///
/// Owned by its [`InstanceTarget`]. The handle returned to the host stays
/// valid after unregistration but becomes inert: its scope is cancelled and
/// work posted through its executor is dropped.
pub struct RuntimeTarget {
	id: TargetId,
	delegate: Box<dyn RuntimeTargetDelegate>,
	executor: ScopedExecutor<RuntimeTarget>,
	instance: Weak<InstanceTarget>,
	scope: Scope,
}

impl RuntimeTarget {
	pub(crate) fn new(
		delegate: Box<dyn RuntimeTargetDelegate>,
		executor: VoidExecutor,
		instance: Weak<InstanceTarget>,
	) -> Arc<Self> {
		let scope = Scope::new();
		let token = scope.token();
		Arc::new_cyclic(|weak| Self {
			id: TargetId::next(),
			delegate,
			executor: ScopedExecutor::new(executor, Weak::clone(weak), token),
			instance,
			scope,
		})
	}

	pub fn id(&self) -> TargetId {
		self.id
	}

	pub fn delegate(&self) -> &dyn RuntimeTargetDelegate {
		self.delegate.as_ref()
	}

	/// Returns the delegate as its concrete type, if it is a `T`.
	pub fn delegate_as<T: RuntimeTargetDelegate>(&self) -> Option<&T> {
		self.delegate().downcast_ref::<T>()
	}

	/// Executor bound to this runtime's lifetime.
	pub fn scoped_executor(&self) -> ScopedExecutor<RuntimeTarget> {
		self.executor.clone()
	}

	pub fn instance(&self) -> Option<Arc<InstanceTarget>> {
		self.instance.upgrade()
	}

	/// False once the owning instance has unregistered this runtime.
	pub fn is_registered(&self) -> bool {
		!self.scope.is_cancelled()
	}

	pub(crate) fn detach(&self) -> bool {
		self.scope.cancel()
	}
}

impl fmt::Debug for RuntimeTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RuntimeTarget")
			.field("id", &self.id)
			.field("registered", &self.is_registered())
			.finish()
	}
}
