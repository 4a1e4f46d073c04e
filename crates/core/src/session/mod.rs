//! Frontend sessions and message routing.
//!
//! A session is created per accepted connection and owns the
//! [`SessionState`], so what the frontend enabled survives runtime swaps.
//! Routing walks the target levels top-down (page, instance, runtime); the
//! first level that claims a request answers it. Requests nobody claims are
//! answered with `TargetUnavailable` or `MethodNotFound`.
//!
//! Lock order is session, then page, then instance. Targets never call into
//! a session while holding their own lock.

mod agents;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use jsinspector_protocol::methods::{RUNTIME_DISABLE, RUNTIME_ENABLE};
use jsinspector_protocol::{ProtocolError, Request};
use jsinspector_runtime::{FrontendChannel, Scope, ScopedExecutor, VoidExecutor};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::{debug, warn};

use self::agents::{InstanceAgent, RuntimeAgent, handle_page_request};
use crate::delegate::AgentContext;
use crate::options::ConnectOptions;
use crate::page::PageTarget;
use crate::runtime::RuntimeTarget;
use crate::session_state::{SessionState, SessionStateUpdater};

/// Domains whose enable/disable the session tracks and answers itself.
const TRACKED_DOMAINS: &[&str] = &["Runtime", "Log"];

/// Domains served by a runtime; unanswerable while no runtime is registered.
const RUNTIME_DOMAINS: &[&str] = &[
	"Runtime",
	"Debugger",
	"HeapProfiler",
	"Profiler",
	"Console",
	"Log",
];

pub(crate) type SessionId = u64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct Session {
	id: SessionId,
	page: Weak<PageTarget>,
	weak_self: Weak<Session>,
	frontend: FrontendChannel,
	executor: ScopedExecutor<Session>,
	scope: Scope,
	integration_name: Option<String>,
	inner: Mutex<SessionInner>,
}

struct SessionInner {
	state: SessionState,
	instance: Option<InstanceAgent>,
}

impl Session {
	pub(crate) fn new(
		page: Weak<PageTarget>,
		frontend: FrontendChannel,
		executor: VoidExecutor,
		options: ConnectOptions,
	) -> Arc<Self> {
		let scope = Scope::new();
		let token = scope.token();
		Arc::new_cyclic(|weak| Self {
			id: NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst),
			page,
			weak_self: Weak::clone(weak),
			frontend,
			executor: ScopedExecutor::new(executor, Weak::clone(weak), token),
			scope,
			integration_name: options.integration_name,
			inner: Mutex::new(SessionInner {
				state: SessionState::new(),
				instance: None,
			}),
		})
	}

	pub(crate) fn id(&self) -> SessionId {
		self.id
	}

	pub(crate) fn integration_name(&self) -> Option<&str> {
		self.integration_name.as_deref()
	}

	pub(crate) fn is_live(&self) -> bool {
		!self.scope.is_cancelled()
	}

	/// Queues `message` for routing on the page executor.
	pub(crate) fn post_message(&self, message: String) {
		self.executor.execute(move |session| session.handle_message(&message));
	}

	pub(crate) fn schedule_sync(&self) {
		self.executor.execute(|session| session.sync());
	}

	pub(crate) fn with_state_mut<F>(&self, f: F)
	where
		F: FnOnce(&mut SessionState),
	{
		f(&mut self.inner.lock().state);
	}

	/// Ends the session. Only the first call has any effect.
	pub(crate) fn disconnect(&self) {
		if !self.scope.cancel() {
			return;
		}
		debug!(session = self.id, "Session disconnected");
		self.frontend.close();
		// The lock may be held by a handler on this or another thread; the
		// agents are then released on the page executor once it is free.
		match self.inner.try_lock() {
			Some(mut inner) => inner.instance = None,
			None => {
				let session = Weak::clone(&self.weak_self);
				self.executor.executor().execute(Box::new(move || {
					if let Some(session) = session.upgrade() {
						session.inner.lock().instance = None;
						debug!(session = session.id, "Session agents released");
					}
				}));
			}
		}
		if let Some(page) = self.page.upgrade() {
			page.remove_session(self.id);
		}
	}

	fn agent_context(&self, runtime: &Arc<RuntimeTarget>) -> AgentContext {
		AgentContext {
			frontend: self.frontend.clone(),
			executor: runtime.scoped_executor(),
			session: SessionStateUpdater::new(self.executor.clone()),
		}
	}

	/// Brings the session's agents in line with the page's current instance
	/// and runtime, emitting context notifications for what changed.
	pub(crate) fn sync(&self) {
		if !self.is_live() {
			return;
		}
		let Some(page) = self.page.upgrade() else {
			return;
		};
		let mut inner = self.inner.lock();
		self.sync_locked(&page, &mut inner);
	}

	fn sync_locked(&self, page: &PageTarget, inner: &mut SessionInner) {
		let instance = page.current_instance();
		let runtime = instance
			.as_ref()
			.and_then(|i| i.current_runtime())
			.filter(|r| r.is_registered());

		let SessionInner {
			state,
			instance: agent,
		} = inner;

		let instance_id = instance.as_ref().map(|i| i.id());
		if agent.as_ref().map(|a| a.instance_id()) != instance_id {
			if let Some(old) = agent.take() {
				old.detach(&self.frontend, state);
			}
			*agent = instance.as_ref().map(InstanceAgent::new);
		}

		let Some(agent) = agent.as_mut() else {
			return;
		};
		if agent.runtime_id() == runtime.as_ref().map(|r| r.id()) {
			return;
		}
		if let Some(old) = agent.runtime.take() {
			old.detach(&self.frontend, state);
		}
		if let Some(runtime) = runtime {
			let context = self.agent_context(&runtime);
			agent.runtime = Some(RuntimeAgent::attach(&runtime, context, state));
		}
	}

	/// Parses and routes one incoming message, answering it when required.
	pub(crate) fn handle_message(&self, text: &str) {
		let request = match Request::parse(text) {
			Ok(request) => request,
			Err(failure) if failure.notification => {
				debug!(session = self.id, error = %failure.error, "Dropping malformed notification");
				return;
			}
			Err(failure) => {
				warn!(session = self.id, id = ?failure.id, error = %failure.error, "Malformed message");
				self.frontend.send_error(failure.id, &failure.error);
				return;
			}
		};
		debug!(session = self.id, id = ?request.id, method = %request.method, "RECV");

		let Some(page) = self.page.upgrade() else {
			return;
		};

		let mut inner = self.inner.lock();
		// The tree may have changed since the last posted sync ran.
		self.sync_locked(&page, &mut inner);
		let outcome = self.route(&page, &mut inner, &request);
		let error = match outcome {
			Ok(true) => return,
			Ok(false) => unhandled_error(&inner, &request),
			Err(error) => error,
		};
		drop(inner);

		match request.id {
			Some(id) => {
				warn!(session = self.id, id, method = %request.method, error = %error, "Request failed");
				self.frontend.send_error(Some(id), &error);
			}
			None => debug!(session = self.id, method = %request.method, "Unhandled notification"),
		}
	}

	fn route(
		&self,
		page: &PageTarget,
		inner: &mut SessionInner,
		request: &Request,
	) -> Result<bool, ProtocolError> {
		let toggle = domain_toggle(request);
		let tracked = toggle.filter(|(domain, _)| TRACKED_DOMAINS.contains(domain));
		let previous = tracked.map(|(domain, enabled)| {
			let was_enabled = inner.state.is_domain_enabled(domain);
			inner.state.set_domain_enabled(domain, enabled);
			(domain, was_enabled)
		});

		let outcome = self.dispatch(page, inner, request, toggle, tracked.is_some());
		if outcome.is_err() {
			if let Some((domain, was_enabled)) = previous {
				inner.state.set_domain_enabled(domain, was_enabled);
			}
		}
		outcome
	}

	fn dispatch(
		&self,
		page: &PageTarget,
		inner: &mut SessionInner,
		request: &Request,
		toggle: Option<(&str, bool)>,
		tracked: bool,
	) -> Result<bool, ProtocolError> {
		let SessionInner { state, instance } = inner;
		if handle_page_request(page, request, &self.frontend, state)? {
			return Ok(true);
		}

		let mut handled = false;
		if let Some(agent) = instance.as_mut() {
			handled = agent.handle_request(request, &self.frontend)?;
			if !handled {
				if let Some(runtime) = agent.runtime.as_mut() {
					handled = runtime.handle_request(request, state)?;
				}
			}
		}

		let runtime = instance.as_mut().and_then(|a| a.runtime.as_mut());
		match request.method.as_str() {
			RUNTIME_ENABLE => {
				if !handled {
					self.answer_empty(request);
					handled = true;
				}
				if let Some(runtime) = runtime {
					runtime.announce(&self.frontend, state);
				}
			}
			RUNTIME_DISABLE => {
				if !handled {
					self.answer_empty(request);
					handled = true;
				}
				if let Some(runtime) = runtime {
					runtime.forget_context();
				}
			}
			_ => {}
		}

		if !handled && tracked {
			self.answer_empty(request);
			handled = true;
		}

		if handled && !tracked {
			if let Some((domain, enabled)) = toggle {
				state.set_domain_enabled(domain, enabled);
				if let Value::Object(options) = &request.params {
					if enabled {
						state.set_domain_options(domain, options.clone());
					}
				}
			}
		}

		Ok(handled)
	}

	fn answer_empty(&self, request: &Request) {
		if let Some(id) = request.id {
			self.frontend.send_result(id, json!({}));
		}
	}
}

/// Returns `(domain, enabled)` for `X.enable` / `X.disable`.
fn domain_toggle(request: &Request) -> Option<(&str, bool)> {
	match request.method_name() {
		"enable" => Some((request.domain(), true)),
		"disable" => Some((request.domain(), false)),
		_ => None,
	}
}

fn unhandled_error(inner: &SessionInner, request: &Request) -> ProtocolError {
	let has_runtime = inner
		.instance
		.as_ref()
		.is_some_and(|agent| agent.runtime.is_some());
	if !has_runtime && RUNTIME_DOMAINS.contains(&request.domain()) {
		ProtocolError::target_unavailable(&request.method)
	} else {
		ProtocolError::method_not_found(&request.method)
	}
}
