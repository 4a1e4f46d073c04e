//! Embedded inspector backend for JavaScript runtimes.
//!
//! The host builds a tree of targets that mirrors what it can debug:
//!
//! ```text
//! PageTarget            one per debuggable page, accepts frontend connections
//! └── InstanceTarget    one per application instance, survives JS reloads
//!     └── RuntimeTarget at most one live JavaScript runtime per instance
//! ```
//!
//! A frontend connects to a page through [`PageTarget::connect`] and talks a
//! CDP-style protocol over the returned [`PageConnection`]. Each message is
//! routed down the tree to the level that understands its domain; engine
//! specifics are supplied through the traits in [`delegate`].
//!
//! Per-session state (enabled domains, breakpoints, execution context ids)
//! lives in [`SessionState`] and is kept across runtime swaps, so a frontend
//! stays attached and consistent while the host reloads its JavaScript.
//!
//! The crate never spawns threads. Work is posted to executors the host
//! supplies; see [`jsinspector_runtime`] for the executor contract and stock
//! implementations.

pub mod delegate;
pub mod error;
pub mod fallback;
pub mod instance;
pub mod options;
pub mod page;
pub mod runtime;
mod session;
pub mod session_state;
pub mod target;

pub use delegate::{
	AgentContext, InstanceTargetDelegate, PageTargetDelegate, RuntimeAgentDelegate,
	RuntimeTargetDelegate,
};
pub use error::{Error, Result};
pub use fallback::{FallbackRuntimeAgentDelegate, FallbackRuntimeTargetDelegate};
pub use instance::InstanceTarget;
pub use options::{ConnectOptions, PageOptions, SessionPolicy};
pub use page::{PageConnection, PageTarget};
pub use runtime::RuntimeTarget;
pub use session_state::{DomainState, SessionState, SessionStateUpdater};
pub use target::{TargetId, TargetKind};

pub use jsinspector_protocol as protocol;
pub use jsinspector_runtime::{
	Executor, FrontendChannel, LocalConnection, ManualExecutor, QueuedImmediateExecutor,
	RemoteConnection, Scope, ScopeToken, ScopedExecutor, SerialExecutor, Task, VoidExecutor,
};
