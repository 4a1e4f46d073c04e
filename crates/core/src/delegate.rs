//! Capabilities the embedding host supplies at each target level.
//!
//! The core owns the target tree and the routing; everything engine- or
//! host-specific is reached through these traits. One implementation per
//! supported engine is expected, plus the fallback in [`crate::fallback`]
//! for engines without debugging support.

use downcast_rs::{DowncastSync, impl_downcast};
use jsinspector_protocol::{PageReloadRequest, ProtocolError, Request};
use jsinspector_runtime::{FrontendChannel, ScopedExecutor};

use crate::runtime::RuntimeTarget;
use crate::session_state::{SessionState, SessionStateUpdater};

/// Host hooks for a page.
pub trait PageTargetDelegate: Send + Sync {
	/// The frontend asked for a reload.
	///
	/// Called on the page executor. The host is expected to tear down the
	/// current instance and register a fresh one, either synchronously or
	/// by posting to its own threads.
	fn on_reload(&self, request: &PageReloadRequest);
}

/// Host hooks for an application instance.
pub trait InstanceTargetDelegate: Send + Sync {
	/// Handles a request at the instance level.
	///
	/// Return `Ok(true)` after answering through `frontend`, `Ok(false)` to
	/// let the runtime level see the request, or `Err` to answer with an error.
	fn handle_request(
		&self,
		request: &Request,
		frontend: &FrontendChannel,
	) -> Result<bool, ProtocolError> {
		let _ = (request, frontend);
		Ok(false)
	}
}

/// Per-engine adapter owned by a [`RuntimeTarget`].
///
/// Hosts can recover their concrete adapter with
/// [`RuntimeTarget::delegate_as`].
pub trait RuntimeTargetDelegate: DowncastSync {
	/// Creates the agent that serves one session against this runtime.
	///
	/// `state` reflects what the session enabled before this runtime existed,
	/// so breakpoints and domain toggles can be re-applied here.
	fn create_agent_delegate(
		&self,
		context: AgentContext,
		state: &SessionState,
	) -> Box<dyn RuntimeAgentDelegate>;

	/// Name shown for this runtime's execution context.
	fn execution_context_name(&self) -> String {
		"main".to_string()
	}
}

impl_downcast!(sync RuntimeTargetDelegate);

/// Handles protocol requests for one runtime within one session.
///
/// Dropped when the runtime is unregistered or the session ends, before the
/// frontend is told its execution contexts were cleared.
pub trait RuntimeAgentDelegate: Send {
	/// Return `Ok(true)` if the request was (or will be) answered, `Ok(false)`
	/// if the method is unknown to this agent, or `Err` to answer with an
	/// error. Panics are caught and reported as internal errors.
	fn handle_request(
		&mut self,
		request: &Request,
		state: &mut SessionState,
	) -> Result<bool, ProtocolError>;
}

/// What a runtime agent needs to talk back to its session.
#[derive(Clone)]
pub struct AgentContext {
	/// Channel to the session's frontend.
	pub frontend: FrontendChannel,
	/// Executor for work on the runtime's thread; dropped once the runtime
	/// is unregistered.
	pub executor: ScopedExecutor<RuntimeTarget>,
	/// Schedules session state changes from any thread.
	pub session: SessionStateUpdater,
}
