//! Optional observability helpers for acquisition attempts.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `broker_credential.acquire` with the
//!   `attempt` (operating system account or interactive) and `stage` (call site) fields, plus a
//!   debug event whenever the operating system account attempt falls back.
//! - Enable `metrics` to increment the `broker_credential_acquisition_total` counter for every
//!   attempt/success/fallback/failure, labeled by `attempt` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Acquisition attempts observed by the credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquisitionKind {
	/// Silent attempt reusing the signed-in operating system account.
	OperatingSystemAccount,
	/// Interactive browser or broker attempt.
	Interactive,
}
impl AcquisitionKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquisitionKind::OperatingSystemAccount => "operating_system_account",
			AcquisitionKind::Interactive => "interactive",
		}
	}
}
impl Display for AcquisitionKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquisitionOutcome {
	/// Entry to an attempt.
	Attempt,
	/// The attempt produced an access token.
	Success,
	/// The attempt produced no token and the next attempt takes over.
	Fallback,
	/// The attempt failed and its outcome goes back to the caller.
	Failure,
}
impl AcquisitionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquisitionOutcome::Attempt => "attempt",
			AcquisitionOutcome::Success => "success",
			AcquisitionOutcome::Fallback => "fallback",
			AcquisitionOutcome::Failure => "failure",
		}
	}
}
impl Display for AcquisitionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
