//! Target identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a page, instance or runtime target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(u64);

impl TargetId {
	/// Returns a new globally-unique target ID.
	pub fn next() -> Self {
		Self(NEXT_TARGET_ID.fetch_add(1, Ordering::SeqCst))
	}

	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl fmt::Display for TargetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Level of a target in the page / instance / runtime tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
	Page,
	Instance,
	Runtime,
}

impl fmt::Display for TargetKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TargetKind::Page => "Page",
			TargetKind::Instance => "Instance",
			TargetKind::Runtime => "Runtime",
		})
	}
}
