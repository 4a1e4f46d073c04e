//! Connection endpoints between the inspector and a frontend.
//!
//! The host transport implements [`RemoteConnection`] (messages flowing out to
//! the frontend). Connecting to a page hands back a [`LocalConnection`]
//! (messages flowing in). Inside the inspector, outgoing traffic is written
//! through a [`FrontendChannel`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jsinspector_protocol::{Notification, ProtocolError, RequestId, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{trace, warn};

/// Outgoing half of a frontend connection, implemented by the host.
pub trait RemoteConnection: Send + Sync {
	/// Delivers one complete protocol message to the frontend.
	fn on_message(&self, message: String);

	/// Called exactly once when the session ends, whichever side ended it.
	fn on_disconnect(&self);
}

/// Incoming half of a frontend connection, returned by the inspector.
pub trait LocalConnection: Send + Sync {
	/// Submits one complete protocol message from the frontend.
	fn send_message(&self, message: String);

	/// Ends the session. Idempotent.
	fn disconnect(&self);
}

/// Cloneable writer over a [`RemoteConnection`].
///
/// After [`close`](Self::close) every send is a no-op, so late callbacks
/// never reach a frontend that has been told the session ended.
#[derive(Clone)]
pub struct FrontendChannel {
	remote: Arc<dyn RemoteConnection>,
	open: Arc<AtomicBool>,
}

impl FrontendChannel {
	pub fn new(remote: Arc<dyn RemoteConnection>) -> Self {
		Self {
			remote,
			open: Arc::new(AtomicBool::new(true)),
		}
	}

	/// Sends pre-serialized text.
	pub fn send_text(&self, message: String) {
		if !self.is_open() {
			trace!("Dropping message for closed frontend");
			return;
		}
		trace!(message = %message, "SEND");
		self.remote.on_message(message);
	}

	/// Serializes and sends any protocol value.
	pub fn send<T: Serialize>(&self, message: &T) {
		match serde_json::to_string(message) {
			Ok(text) => self.send_text(text),
			Err(e) => warn!(error = %e, "Failed to serialize outgoing message"),
		}
	}

	/// Answers request `id` successfully.
	pub fn send_result(&self, id: RequestId, result: Value) {
		self.send(&Response::success(id, result));
	}

	/// Answers a request with an error; `id` is `None` when it could not be recovered.
	pub fn send_error(&self, id: Option<RequestId>, error: &ProtocolError) {
		self.send(&Response::failure(id, error));
	}

	pub fn send_notification(&self, method: &str, params: Option<Value>) {
		self.send(&Notification::new(method, params));
	}

	/// Closes the channel and notifies the remote end.
	///
	/// Returns `true` for the call that closed it; later calls do nothing.
	pub fn close(&self) -> bool {
		if self.open.swap(false, Ordering::AcqRel) {
			self.remote.on_disconnect();
			true
		} else {
			false
		}
	}

	pub fn is_open(&self) -> bool {
		self.open.load(Ordering::Acquire)
	}
}

impl fmt::Debug for FrontendChannel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FrontendChannel")
			.field("open", &self.is_open())
			.finish()
	}
}
