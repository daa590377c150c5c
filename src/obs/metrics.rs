// self
use crate::obs::{AcquisitionKind, AcquisitionOutcome};

/// Records an attempt outcome via the global metrics recorder (when enabled).
pub fn record_acquisition_outcome(kind: AcquisitionKind, outcome: AcquisitionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"broker_credential_acquisition_total",
			"attempt" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
