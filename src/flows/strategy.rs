//! Ordering and fallback between the two acquisition attempts.
//!
//! With [`BrokerOptions::use_operating_system_account`] set, a silent attempt (`prompt=none`)
//! runs first and wins whenever it yields an access token. Socket-level failures and token-less
//! results from that attempt fall through to the interactive attempt (`prompt=select_account`);
//! every other failure propagates. The interactive attempt is the last word: its result goes to
//! the classifier as-is, and a socket-level failure there means no user interaction could happen
//! at all, reported as [`AcquisitionError::ListenerUnavailable`].

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, TokenResult},
	client::{AcquireError, ClientApplication, InteractiveRequest, Prompt},
	config::{BrokerOptions, CredentialConfig},
	error::{BoxError, TransportError},
	obs::{self, AcquisitionKind, AcquisitionOutcome, AcquisitionSpan},
};

/// Failures of an acquisition run that reach the classifier.
#[derive(Debug, ThisError)]
pub enum AcquisitionError {
	/// The interactive attempt could not bind a loopback listener.
	#[error("Couldn't start an HTTP server.")]
	ListenerUnavailable {
		/// Socket-level failure raised by the client application.
		#[source]
		source: TransportError,
	},
	/// The client application failed outside the socket-level shape.
	#[error("{source}")]
	Client {
		/// Collaborator-specific failure.
		#[source]
		source: BoxError,
	},
}

/// Per-credential attempt parameters fixed at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquisitionStrategy {
	/// Platform broker options.
	pub broker: BrokerOptions,
	/// Username suggestion for the sign-in page.
	pub login_hint: Option<String>,
	/// How long each attempt may wait for the user.
	pub timeout: Duration,
	/// Fixed loopback port.
	pub port: Option<u16>,
}
impl AcquisitionStrategy {
	/// Extracts the attempt parameters from `config`.
	pub fn from_config(config: &CredentialConfig) -> Self {
		Self {
			broker: config.broker.clone(),
			login_hint: config.login_hint.clone(),
			timeout: config.timeout(),
			port: config.port(),
		}
	}

	/// Request sent to the client application for one attempt.
	pub fn request(
		&self,
		scopes: &ScopeList,
		claims_challenge: Option<&str>,
		prompt: Prompt,
	) -> InteractiveRequest {
		InteractiveRequest {
			scopes: scopes.clone(),
			login_hint: self.login_hint.clone(),
			claims_challenge: claims_challenge.map(ToOwned::to_owned),
			timeout: self.timeout,
			prompt,
			port: self.port,
			parent_window_handle: self.broker.parent_window_handle,
			enable_msa_passthrough: self.broker.enable_msa_passthrough,
		}
	}

	/// Runs the operating system account attempt (when enabled) and then, unless it produced a
	/// token, the interactive attempt.
	pub async fn acquire(
		&self,
		app: &dyn ClientApplication,
		scopes: &ScopeList,
		claims_challenge: Option<&str>,
	) -> Result<TokenResult, AcquisitionError> {
		if self.broker.use_operating_system_account {
			let request = self.request(scopes, claims_challenge, Prompt::None);

			if let Some(result) = self.try_operating_system_account(app, &request).await? {
				return Ok(result);
			}
		}

		let request = self.request(scopes, claims_challenge, Prompt::SelectAccount);

		self.interactive(app, &request).await
	}

	async fn try_operating_system_account(
		&self,
		app: &dyn ClientApplication,
		request: &InteractiveRequest,
	) -> Result<Option<TokenResult>, AcquisitionError> {
		const KIND: AcquisitionKind = AcquisitionKind::OperatingSystemAccount;

		let span = AcquisitionSpan::new(KIND, "try_operating_system_account");

		obs::record_acquisition_outcome(KIND, AcquisitionOutcome::Attempt);

		let outcome = span.instrument(app.acquire_token_interactive(request)).await;

		match outcome {
			Ok(result) if result.is_success() => {
				obs::record_acquisition_outcome(KIND, AcquisitionOutcome::Success);

				Ok(Some(result))
			},
			Ok(_) => {
				obs::record_acquisition_outcome(KIND, AcquisitionOutcome::Fallback);
				obs::trace_fallback("no_token");

				Ok(None)
			},
			Err(AcquireError::Transport(_)) => {
				obs::record_acquisition_outcome(KIND, AcquisitionOutcome::Fallback);
				obs::trace_fallback("transport");

				Ok(None)
			},
			Err(AcquireError::Other { source }) => {
				obs::record_acquisition_outcome(KIND, AcquisitionOutcome::Failure);

				Err(AcquisitionError::Client { source })
			},
		}
	}

	async fn interactive(
		&self,
		app: &dyn ClientApplication,
		request: &InteractiveRequest,
	) -> Result<TokenResult, AcquisitionError> {
		const KIND: AcquisitionKind = AcquisitionKind::Interactive;

		let span = AcquisitionSpan::new(KIND, "interactive");

		obs::record_acquisition_outcome(KIND, AcquisitionOutcome::Attempt);

		let outcome = span
			.instrument(app.acquire_token_interactive(request))
			.await
			.map_err(|err| match err {
				AcquireError::Transport(source) => AcquisitionError::ListenerUnavailable { source },
				AcquireError::Other { source } => AcquisitionError::Client { source },
			});
		let label = match &outcome {
			Ok(result) if result.is_success() => AcquisitionOutcome::Success,
			_ => AcquisitionOutcome::Failure,
		};

		obs::record_acquisition_outcome(KIND, label);

		outcome
	}
}
