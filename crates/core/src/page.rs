//! Page targets: the root of the target tree and the transport's entry point.
//!
//! # Threading
//!
//! All session work (routing, state changes, execution context bookkeeping)
//! runs on the executor given to [`PageTarget::create`]. That executor must
//! not run a task re-entrantly from inside another task; use a queueing
//! executor such as [`QueuedImmediateExecutor`] when everything happens on
//! one thread.
//!
//! Tree changes (`register_*` / `unregister_*`) may be called from any thread.
//! They update the tree immediately and post a resynchronization of the
//! session onto the page executor.
//!
//! [`QueuedImmediateExecutor`]: jsinspector_runtime::QueuedImmediateExecutor

use std::fmt;
use std::sync::{Arc, Weak};

use jsinspector_protocol::{PageReloadRequest, RequestId};
use jsinspector_runtime::{
	FrontendChannel, LocalConnection, RemoteConnection, Scope, ScopedExecutor, VoidExecutor,
};
use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, warn};

use crate::delegate::{InstanceTargetDelegate, PageTargetDelegate};
use crate::error::{Error, Result};
use crate::instance::InstanceTarget;
use crate::options::{ConnectOptions, PageOptions, SessionPolicy};
use crate::session::{Session, SessionId};
use crate::target::{TargetId, TargetKind};

/// A debuggable page.
pub struct PageTarget {
	id: TargetId,
	delegate: Box<dyn PageTargetDelegate>,
	executor: VoidExecutor,
	scoped: ScopedExecutor<PageTarget>,
	options: PageOptions,
	weak_self: Weak<PageTarget>,
	scope: Scope,
	inner: Mutex<PageInner>,
}

#[derive(Default)]
struct PageInner {
	/// In registration order; the last one receives instance-level traffic.
	instances: Vec<Arc<InstanceTarget>>,
	session: Option<Arc<Session>>,
}

impl PageTarget {
	/// Creates a page with default options.
	pub fn create(delegate: Box<dyn PageTargetDelegate>, executor: VoidExecutor) -> Arc<Self> {
		Self::create_with_options(delegate, executor, PageOptions::default())
	}

	pub fn create_with_options(
		delegate: Box<dyn PageTargetDelegate>,
		executor: VoidExecutor,
		options: PageOptions,
	) -> Arc<Self> {
		let scope = Scope::new();
		let token = scope.token();
		let page = Arc::new_cyclic(|weak: &Weak<PageTarget>| Self {
			id: TargetId::next(),
			delegate,
			executor: Arc::clone(&executor),
			scoped: ScopedExecutor::new(executor, Weak::clone(weak), token),
			options,
			weak_self: Weak::clone(weak),
			scope,
			inner: Mutex::new(PageInner::default()),
		});
		debug!(page = %page.id, policy = ?page.options.session_policy, "Page created");
		page
	}

	pub fn id(&self) -> TargetId {
		self.id
	}

	pub fn options(&self) -> &PageOptions {
		&self.options
	}

	/// Connects a frontend.
	///
	/// With [`SessionPolicy::Reject`] a second live connection fails with
	/// [`Error::SessionActive`] and `remote` is dropped without callbacks.
	/// With [`SessionPolicy::Supersede`] the existing session is disconnected
	/// first. The returned connection disconnects when dropped.
	pub fn connect(
		&self,
		remote: Box<dyn RemoteConnection>,
		options: ConnectOptions,
	) -> Result<PageConnection> {
		let mut inner = self.inner.lock();
		let active = inner
			.session
			.as_ref()
			.filter(|s| s.is_live())
			.map(|s| s.id());
		let superseded = match (active, self.options.session_policy) {
			(Some(existing), SessionPolicy::Reject) => {
				warn!(page = %self.id, session = existing, "Rejecting second connection");
				return Err(Error::SessionActive { page: self.id });
			}
			(Some(_), SessionPolicy::Supersede) => inner.session.take(),
			(None, _) => None,
		};

		let frontend = FrontendChannel::new(Arc::from(remote));
		let session = Session::new(
			Weak::clone(&self.weak_self),
			frontend,
			Arc::clone(&self.executor),
			options,
		);
		inner.session = Some(Arc::clone(&session));
		drop(inner);

		if let Some(old) = superseded {
			debug!(page = %self.id, session = old.id(), "Superseding session");
			old.disconnect();
		}

		debug!(
			page = %self.id,
			session = session.id(),
			integration = ?session.integration_name(),
			"Frontend connected"
		);
		session.schedule_sync();
		Ok(PageConnection { session })
	}

	/// Returns true while a frontend session is live.
	pub fn has_session(&self) -> bool {
		self.inner.lock().session.as_ref().is_some_and(|s| s.is_live())
	}

	/// Registers a new application instance. It receives instance-level
	/// traffic until another instance is registered after it.
	pub fn register_instance(&self, delegate: Box<dyn InstanceTargetDelegate>) -> Arc<InstanceTarget> {
		let instance = InstanceTarget::new(delegate, Weak::clone(&self.weak_self));
		self.inner.lock().instances.push(Arc::clone(&instance));
		debug!(page = %self.id, instance = %instance.id(), "Instance registered");
		self.notify_session();
		instance
	}

	/// Unregisters `instance` together with its live runtime, if any.
	pub fn unregister_instance(&self, instance: &Arc<InstanceTarget>) -> Result<()> {
		let removed = {
			let mut inner = self.inner.lock();
			inner
				.instances
				.iter()
				.position(|i| Arc::ptr_eq(i, instance))
				.map(|index| inner.instances.remove(index))
		};
		let Some(instance) = removed else {
			return Err(Error::NotRegistered {
				kind: TargetKind::Instance,
				id: instance.id(),
			});
		};

		instance.detach();
		debug!(page = %self.id, instance = %instance.id(), "Instance unregistered");
		self.notify_session();
		Ok(())
	}

	/// The instance that currently receives instance-level traffic.
	pub fn current_instance(&self) -> Option<Arc<InstanceTarget>> {
		self.inner.lock().instances.last().cloned()
	}

	pub(crate) fn session(&self) -> Option<Arc<Session>> {
		self.inner.lock().session.clone()
	}

	pub(crate) fn remove_session(&self, id: SessionId) {
		let mut inner = self.inner.lock();
		if inner.session.as_ref().is_some_and(|s| s.id() == id) {
			inner.session = None;
		}
	}

	/// Posts a resynchronization of the live session with the tree.
	pub(crate) fn notify_session(&self) {
		self.scoped.execute(|page| {
			if let Some(session) = page.session() {
				session.sync();
			}
		});
	}

	/// Runs the host reload callback on the page executor, then answers `id`.
	///
	/// The answer is posted behind whatever the reload itself posted, so the
	/// resulting context notifications reach the frontend first.
	pub(crate) fn schedule_reload(
		&self,
		request: PageReloadRequest,
		id: Option<RequestId>,
		frontend: FrontendChannel,
	) {
		self.scoped.execute(move |page| {
			debug!(page = %page.id, ?request, "Reloading");
			page.delegate.on_reload(&request);
			if let Some(id) = id {
				page.scoped.execute(move |_| frontend.send_result(id, json!({})));
			}
		});
	}
}

impl Drop for PageTarget {
	fn drop(&mut self) {
		self.scope.cancel();
		let inner = self.inner.get_mut();
		let session = inner.session.take();
		for instance in inner.instances.drain(..) {
			instance.detach();
		}
		if let Some(session) = session {
			session.disconnect();
		}
		debug!(page = %self.id, "Page destroyed");
	}
}

impl fmt::Debug for PageTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("PageTarget")
			.field("id", &self.id)
			.field("instances", &inner.instances.len())
			.field("session", &inner.session.as_ref().map(|s| s.id()))
			.finish()
	}
}

/// The host's handle on one frontend session.
///
/// Messages are routed on the page executor in the order they were sent.
/// Dropping the connection disconnects it.
pub struct PageConnection {
	session: Arc<Session>,
}

impl PageConnection {
	/// Returns true until either side disconnects.
	pub fn is_connected(&self) -> bool {
		self.session.is_live()
	}
}

impl LocalConnection for PageConnection {
	fn send_message(&self, message: String) {
		self.session.post_message(message);
	}

	fn disconnect(&self) {
		self.session.disconnect();
	}
}

impl Drop for PageConnection {
	fn drop(&mut self) {
		self.session.disconnect();
	}
}

impl fmt::Debug for PageConnection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PageConnection")
			.field("session", &self.session.id())
			.field("connected", &self.is_connected())
			.finish()
	}
}
