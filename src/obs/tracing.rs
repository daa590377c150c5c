// self
use crate::{_prelude::*, obs::AcquisitionKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAttempt<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAttempt<F> = F;

/// Span wrapping one acquisition attempt.
#[derive(Clone, Debug)]
pub struct AcquisitionSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AcquisitionSpan {
	/// Creates a new span tagged with the provided attempt kind + stage.
	pub fn new(kind: AcquisitionKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("broker_credential.acquire", attempt = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAttempt<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when the operating system account attempt hands over to the
/// interactive attempt.
pub fn trace_fallback(reason: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			target: "broker_credential",
			reason,
			"Operating system account attempt yielded no token; prompting interactively."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}
