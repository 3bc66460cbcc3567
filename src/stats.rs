use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::outcome::{LookupError, RoundResult};

/// Why a round failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub concurrency: usize,
	/// Time since the test session started
	pub elapsed: Duration,
	/// First failure in the round, in worker order
	pub cause: LookupError,
	pub failed: usize,
}

/// Pass/fail decision for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
	Passed,
	Failed(Diagnostic),
}

/// Counts for one report row, covering rounds `first_round..=last_round`
#[derive(Debug, Clone)]
pub struct RoundSummary {
	pub first_round: u32,
	pub last_round: u32,
	pub concurrency: usize,
	pub resolved: usize,
	pub failed: usize,
	/// Failure counts keyed by `LookupError::kind`
	pub breakdown: BTreeMap<&'static str, usize>,
	pub elapsed: Duration,
}

/// Decide whether a round passed. Any single failure fails the round.
pub fn evaluate(round: &RoundResult, started: Instant) -> Evaluation {
	let mut failures = round.failures();
	match failures.next() {
		None => Evaluation::Passed,
		Some(cause) => Evaluation::Failed(Diagnostic {
			concurrency: round.concurrency,
			elapsed: started.elapsed(),
			cause: cause.clone(),
			failed: 1 + failures.count(),
		}),
	}
}

/// Tally a round for the report table.
pub fn summarize(round_number: u32, round: &RoundResult, started: Instant) -> RoundSummary {
	let mut breakdown = BTreeMap::new();
	for e in round.failures() {
		*breakdown.entry(e.kind()).or_insert(0) += 1;
	}
	let failed: usize = breakdown.values().sum();
	RoundSummary {
		first_round: round_number,
		last_round: round_number,
		concurrency: round.concurrency,
		resolved: round.outcomes.len() - failed,
		failed,
		breakdown,
		elapsed: started.elapsed(),
	}
}

/// Report rows for a session.
///
/// Consecutive passing rounds at the same concurrency fold into one row, so
/// a duration run holds at most two rows and a ramp run one per level.
#[derive(Debug, Default)]
pub struct RoundHistory {
	rows: Vec<RoundSummary>,
}

impl RoundHistory {
	pub fn record(&mut self, summary: RoundSummary) {
		if let Some(last) = self.rows.last_mut() {
			if last.failed == 0 && summary.failed == 0 && last.concurrency == summary.concurrency {
				last.last_round = summary.last_round;
				last.resolved += summary.resolved;
				last.elapsed = summary.elapsed;
				return;
			}
		}
		self.rows.push(summary);
	}

	pub fn rows(&self) -> &[RoundSummary] {
		&self.rows
	}
}
