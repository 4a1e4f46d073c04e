//! Runtime delegates for engines without debugging support.
//!
//! The fallback agent handles no methods. It only tells the user, through
//! the `Log` domain, why the frontend cannot do anything useful.

use std::time::{SystemTime, UNIX_EPOCH};

use jsinspector_protocol::methods::{LOG_ENABLE, LOG_ENTRY_ADDED};
use jsinspector_protocol::{LogEntry, LogEntryAdded, ProtocolError, Request};
use jsinspector_runtime::FrontendChannel;
use tracing::debug;

use crate::delegate::{AgentContext, RuntimeAgentDelegate, RuntimeTargetDelegate};
use crate::session_state::SessionState;

/// Runtime delegate whose agents only emit an "unsupported" warning.
pub struct FallbackRuntimeTargetDelegate {
	engine_description: String,
}

impl FallbackRuntimeTargetDelegate {
	pub fn new(engine_description: impl Into<String>) -> Self {
		Self {
			engine_description: engine_description.into(),
		}
	}
}

impl RuntimeTargetDelegate for FallbackRuntimeTargetDelegate {
	fn create_agent_delegate(
		&self,
		context: AgentContext,
		state: &SessionState,
	) -> Box<dyn RuntimeAgentDelegate> {
		let agent = FallbackRuntimeAgentDelegate {
			frontend: context.frontend,
			engine_description: self.engine_description.clone(),
		};
		if state.is_domain_enabled("Log") {
			agent.send_warning();
		}
		Box::new(agent)
	}
}

/// Agent that answers nothing itself.
pub struct FallbackRuntimeAgentDelegate {
	frontend: FrontendChannel,
	engine_description: String,
}

impl FallbackRuntimeAgentDelegate {
	fn send_warning(&self) {
		debug!(engine = %self.engine_description, "Debugging unsupported, warning frontend");
		let params = LogEntryAdded {
			entry: LogEntry {
				source: "other".to_string(),
				level: "warning".to_string(),
				text: format!(
					"Debugging is not supported in {}. Consider enabling a debuggable engine.",
					self.engine_description
				),
				timestamp: now_millis(),
			},
		};
		match serde_json::to_value(params) {
			Ok(params) => self.frontend.send_notification(LOG_ENTRY_ADDED, Some(params)),
			Err(e) => debug!(error = %e, "Failed to encode log entry"),
		}
	}
}

impl RuntimeAgentDelegate for FallbackRuntimeAgentDelegate {
	fn handle_request(
		&mut self,
		request: &Request,
		_state: &mut SessionState,
	) -> Result<bool, ProtocolError> {
		if request.method == LOG_ENABLE {
			self.send_warning();
		}
		// Never claims a request; the session answers `Log.enable` itself.
		Ok(false)
	}
}

fn now_millis() -> f64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs_f64() * 1000.0)
		.unwrap_or_default()
}
