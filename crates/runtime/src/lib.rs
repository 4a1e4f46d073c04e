//! Threading and lifetime plumbing for the inspector.
//!
//! The inspector core never owns a thread. Everything it defers is handed to
//! an [`Executor`] supplied by the host, and every deferred callback that
//! refers back to a target goes through a [`ScopedExecutor`] so it is dropped
//! silently once that target is gone.
//!
//! Outgoing traffic leaves through a [`FrontendChannel`], a cloneable handle
//! over the host's [`RemoteConnection`].

pub mod channel;
pub mod executor;
pub mod scope;

pub use channel::{FrontendChannel, LocalConnection, RemoteConnection};
pub use executor::{
	Executor, ManualExecutor, QueuedImmediateExecutor, SerialExecutor, Task, VoidExecutor,
};
pub use scope::{Scope, ScopeToken, ScopedExecutor};
