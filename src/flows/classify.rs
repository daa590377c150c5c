//! Maps acquisition outcomes onto the credential's error taxonomy.
//!
//! Token-less results are [`Error::CredentialUnavailable`] inside a credential chain, so the
//! chain moves on, and [`Error::AuthenticationFailed`] for standalone calls, so the caller fails
//! fast. A listener that cannot start is unavailable in both contexts.

// self
use crate::{_prelude::*, auth::TokenResult, flows::AcquisitionError};

/// Message reported when the interactive attempt cannot bind a loopback listener.
pub const LISTENER_UNAVAILABLE_MESSAGE: &str = "Couldn't start an HTTP server.";
/// Message reported when a token-less result carries no description.
pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Failed to authenticate user";

/// Whether a request runs inside a credential chain's attempt loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChainContext {
	/// Called directly by the application.
	#[default]
	Standalone,
	/// Called by a [`CredentialChain`](crate::chain::CredentialChain).
	Chained,
}

/// Classifies the outcome of one acquisition run.
pub fn classify(
	outcome: Result<TokenResult, AcquisitionError>,
	context: ChainContext,
) -> Result<TokenResult> {
	let result = match outcome {
		Ok(result) => result,
		Err(AcquisitionError::ListenerUnavailable { source }) =>
			return Err(Error::CredentialUnavailable {
				message: LISTENER_UNAVAILABLE_MESSAGE.to_owned(),
				source: Some(Box::new(source)),
			}),
		Err(AcquisitionError::Client { source }) => return Err(Error::Acquisition { source }),
	};

	if result.is_success() {
		return Ok(result);
	}

	let message = result
		.error_description
		.clone()
		.unwrap_or_else(|| AUTHENTICATION_FAILED_MESSAGE.to_owned());

	Err(match context {
		ChainContext::Chained => Error::CredentialUnavailable { message, source: None },
		ChainContext::Standalone => Error::AuthenticationFailed { message, error: result.error },
	})
}
