use hickory_proto::op::ResponseCode;
use thiserror::Error;

/// Classified cause of a failed lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
	#[error("system resolution failed: {0}")]
	SystemResolution(String),

	#[error("transport error: {0}")]
	Transport(String),

	#[error("NS lookup failed: {0}")]
	Protocol(ResponseCode),

	#[error("NS lookup failed: NS returned no resource records")]
	EmptyAnswer,

	#[error("unexpected error: {0}")]
	Unexpected(String),
}

impl LookupError {
	/// Short stable label used when tallying failures by cause
	pub fn kind(&self) -> &'static str {
		match self {
			LookupError::SystemResolution(_) => "system",
			LookupError::Transport(_) => "transport",
			LookupError::Protocol(_) => "protocol",
			LookupError::EmptyAnswer => "empty",
			LookupError::Unexpected(_) => "unexpected",
		}
	}
}

/// Result of a single lookup, produced once and never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
	/// Resolved address or textual record data
	Resolved(String),
	Failed(LookupError),
}

impl LookupOutcome {
	pub fn error(&self) -> Option<&LookupError> {
		match self {
			LookupOutcome::Failed(e) => Some(e),
			LookupOutcome::Resolved(_) => None,
		}
	}
}

/// All outcomes of one round, one slot per requested lookup
#[derive(Debug, Clone)]
pub struct RoundResult {
	pub concurrency: usize,
	pub outcomes: Vec<LookupOutcome>,
}

impl RoundResult {
	pub fn failures(&self) -> impl Iterator<Item = &LookupError> {
		self.outcomes.iter().filter_map(LookupOutcome::error)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_protocol_error_names_rcode() {
		let e = LookupError::Protocol(ResponseCode::NXDomain);
		assert!(e.to_string().starts_with("NS lookup failed: "));
		assert_eq!(e.kind(), "protocol");
	}

	#[test]
	fn test_round_failures_skip_resolved() {
		let round = RoundResult {
			concurrency: 3,
			outcomes: vec![
				LookupOutcome::Resolved("192.0.2.1".to_string()),
				LookupOutcome::Failed(LookupError::EmptyAnswer),
				LookupOutcome::Resolved("192.0.2.1".to_string()),
			],
		};
		let failures: Vec<_> = round.failures().collect();
		assert_eq!(failures, vec![&LookupError::EmptyAnswer]);
	}
}
