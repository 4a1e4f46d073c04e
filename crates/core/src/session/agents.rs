//! Per-session agents, one per target level.
//!
//! Agents are what a session keeps for each target it talks to. They live
//! inside the session lock and never outlive the session; a runtime agent is
//! dropped as soon as its runtime leaves the tree.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use jsinspector_protocol::methods::{
	EXECUTION_CONTEXT_CREATED, EXECUTION_CONTEXTS_CLEARED, PAGE_DISABLE, PAGE_ENABLE, PAGE_RELOAD,
};
use jsinspector_protocol::{
	ExecutionContextCreated, ExecutionContextDescription, PageReloadRequest, ProtocolError, Request,
};
use jsinspector_runtime::FrontendChannel;
use serde_json::json;
use tracing::{debug, error};

use crate::delegate::{AgentContext, RuntimeAgentDelegate};
use crate::instance::InstanceTarget;
use crate::page::PageTarget;
use crate::runtime::RuntimeTarget;
use crate::session_state::SessionState;
use crate::target::TargetId;

/// Handles the page-level methods. Returns `Ok(false)` for anything else.
pub(crate) fn handle_page_request(
	page: &PageTarget,
	request: &Request,
	frontend: &FrontendChannel,
	state: &mut SessionState,
) -> Result<bool, ProtocolError> {
	match request.method.as_str() {
		PAGE_ENABLE | PAGE_DISABLE => {
			state.set_domain_enabled("Page", request.method == PAGE_ENABLE);
			if let Some(id) = request.id {
				frontend.send_result(id, json!({}));
			}
			Ok(true)
		}
		PAGE_RELOAD => {
			let params: PageReloadRequest = request.params_as()?;
			page.schedule_reload(params, request.id, frontend.clone());
			Ok(true)
		}
		_ => Ok(false),
	}
}

/// Session-side view of the current instance.
pub(crate) struct InstanceAgent {
	instance_id: TargetId,
	instance: Weak<InstanceTarget>,
	pub(crate) runtime: Option<RuntimeAgent>,
}

impl InstanceAgent {
	pub(crate) fn new(instance: &Arc<InstanceTarget>) -> Self {
		Self {
			instance_id: instance.id(),
			instance: Arc::downgrade(instance),
			runtime: None,
		}
	}

	pub(crate) fn instance_id(&self) -> TargetId {
		self.instance_id
	}

	pub(crate) fn runtime_id(&self) -> Option<TargetId> {
		self.runtime.as_ref().map(|r| r.runtime_id)
	}

	pub(crate) fn handle_request(
		&self,
		request: &Request,
		frontend: &FrontendChannel,
	) -> Result<bool, ProtocolError> {
		let Some(instance) = self.instance.upgrade() else {
			return Ok(false);
		};
		guarded("Instance", &request.method, || {
			instance.delegate().handle_request(request, frontend)
		})
	}

	/// Detaches the runtime agent, if any, then drops this agent.
	pub(crate) fn detach(mut self, frontend: &FrontendChannel, state: &mut SessionState) {
		if let Some(runtime) = self.runtime.take() {
			runtime.detach(frontend, state);
		}
	}
}

/// Session-side view of a live runtime: its agent delegate and the
/// execution context announced for it.
pub(crate) struct RuntimeAgent {
	runtime_id: TargetId,
	context_name: String,
	context_id: Option<i64>,
	delegate: Box<dyn RuntimeAgentDelegate>,
}

impl RuntimeAgent {
	/// Creates the agent delegate and, if the Runtime domain is enabled,
	/// announces the runtime's execution context.
	pub(crate) fn attach(
		runtime: &Arc<RuntimeTarget>,
		context: AgentContext,
		state: &mut SessionState,
	) -> Self {
		let frontend = context.frontend.clone();
		let delegate = runtime.delegate().create_agent_delegate(context, state);
		let mut agent = Self {
			runtime_id: runtime.id(),
			context_name: runtime.delegate().execution_context_name(),
			context_id: None,
			delegate,
		};
		debug!(runtime = %agent.runtime_id, "Runtime agent attached");
		if state.is_domain_enabled("Runtime") {
			agent.announce(&frontend, state);
		}
		agent
	}

	pub(crate) fn handle_request(
		&mut self,
		request: &Request,
		state: &mut SessionState,
	) -> Result<bool, ProtocolError> {
		let delegate = &mut self.delegate;
		guarded("Runtime", &request.method, || {
			delegate.handle_request(request, state)
		})
	}

	/// Emits `Runtime.executionContextCreated` unless already announced.
	pub(crate) fn announce(&mut self, frontend: &FrontendChannel, state: &mut SessionState) {
		if self.context_id.is_some() {
			return;
		}
		let id = state.next_execution_context_id();
		let created = ExecutionContextCreated {
			context: ExecutionContextDescription {
				id,
				origin: String::new(),
				name: self.context_name.clone(),
				unique_id: format!("{}-{id}", self.runtime_id),
				aux_data: Some(json!({ "isDefault": true })),
			},
		};
		match serde_json::to_value(created) {
			Ok(params) => {
				debug!(runtime = %self.runtime_id, context = id, "Execution context created");
				frontend.send_notification(EXECUTION_CONTEXT_CREATED, Some(params));
				self.context_id = Some(id);
			}
			Err(e) => error!(error = %e, "Failed to encode execution context"),
		}
	}

	/// Forgets the announced context so the next enable announces a new one.
	pub(crate) fn forget_context(&mut self) {
		self.context_id = None;
	}

	/// Drops the agent delegate, then tells an enabled frontend that the
	/// runtime's contexts are gone.
	pub(crate) fn detach(self, frontend: &FrontendChannel, state: &SessionState) {
		let Self {
			runtime_id,
			delegate,
			..
		} = self;
		drop(delegate);
		debug!(runtime = %runtime_id, "Runtime agent detached");
		if state.is_domain_enabled("Runtime") {
			frontend.send_notification(EXECUTION_CONTEXTS_CLEARED, None);
		}
	}
}

/// Runs a delegate call, converting a panic into an internal error.
fn guarded<F>(level: &str, method: &str, f: F) -> Result<bool, ProtocolError>
where
	F: FnOnce() -> Result<bool, ProtocolError>,
{
	match catch_unwind(AssertUnwindSafe(f)) {
		Ok(result) => result,
		Err(payload) => {
			let reason = panic_message(&*payload);
			error!(target_level = level, method, reason = %reason, "Delegate panicked");
			Err(ProtocolError::internal(format!(
				"Internal error while handling '{method}': {reason}"
			)))
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic".to_string()
	}
}
