//! Page and connection options.

use serde::{Deserialize, Serialize};

/// What a page does when a frontend connects while another session is live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPolicy {
	/// Refuse the new connection with [`Error::SessionActive`](crate::Error::SessionActive).
	#[default]
	Reject,
	/// Disconnect the existing session and accept the new one.
	Supersede,
}

/// Options fixed at page creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageOptions {
	pub session_policy: SessionPolicy,
}

impl PageOptions {
	pub fn session_policy(mut self, policy: SessionPolicy) -> Self {
		self.session_policy = policy;
		self
	}
}

/// Options supplied with each `connect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectOptions {
	/// Name of the frontend integration, for logging only.
	pub integration_name: Option<String>,
}

impl ConnectOptions {
	pub fn integration_name(mut self, name: impl Into<String>) -> Self {
		self.integration_name = Some(name.into());
		self
	}
}
