use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info};

use crate::config::{ConfigError, LoadConfig, LoadMode};
use crate::lookup::Lookup;
use crate::pool::dispatch;
use crate::stats::{evaluate, summarize, Diagnostic, Evaluation, RoundHistory};

/// Terminal state of a load test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
	InProgress,
	/// Every round passed; holds the max concurrency
	PassedThrough(usize),
	/// First failing round
	FailedAt(Diagnostic),
}

/// State of one load test run, owned by the controller
#[derive(Debug)]
pub struct TestSession {
	pub started: Instant,
	pub rounds: u32,
	pub concurrency: usize,
	pub verdict: Verdict,
	pub history: RoundHistory,
}

impl TestSession {
	pub fn new(started: Instant) -> Self {
		TestSession {
			started,
			rounds: 0,
			concurrency: 0,
			verdict: Verdict::InProgress,
			history: RoundHistory::default(),
		}
	}

	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}

	pub fn passed(&self) -> bool {
		matches!(self.verdict, Verdict::PassedThrough(_))
	}
}

/// Drives rounds of lookups in ramp or duration mode until the first failure.
pub struct LoadController<'a, L> {
	config: &'a LoadConfig,
	lookup: Arc<L>,
	nameserver: Option<String>,
}

impl<'a, L: Lookup> LoadController<'a, L> {
	/// `nameserver` is None for the system resolver, otherwise the single
	/// nameserver every round of this test is sent to.
	pub fn new(config: &'a LoadConfig, lookup: Arc<L>, nameserver: Option<String>) -> Self {
		LoadController { config, lookup, nameserver }
	}

	/// Run the configured test to its verdict.
	///
	/// The config is checked again here so an invalid one never reaches
	/// the network.
	pub async fn run(&self, started: Instant) -> Result<TestSession, ConfigError> {
		self.config.validate()?;
		let mut session = TestSession::new(started);
		match self.config.mode {
			LoadMode::Ramp { step } => self.run_ramp(&mut session, step).await,
			LoadMode::Duration(duration) => self.run_duration(&mut session, duration).await,
		}
		Ok(session)
	}

	async fn run_ramp(&self, session: &mut TestSession, step: usize) {
		let max = self.config.max;
		info!(
			step, max,
			"Testing DNS resolution from {} to {} concurrent lookups in steps of {}",
			step, max, step
		);

		let mut concurrency = step;
		while concurrency <= max {
			if let Evaluation::Failed(diag) = self.play_round(session, concurrency).await {
				session.verdict = Verdict::FailedAt(diag);
				return;
			}
			concurrency += step;
			if concurrency <= max {
				self.pause().await;
			}
		}

		session.verdict = Verdict::PassedThrough(max);
		info!(max, "DNS resolution worked up to {} concurrent requests", max);
	}

	async fn run_duration(&self, session: &mut TestSession, duration: Duration) {
		let max = self.config.max;
		info!(
			duration_secs = duration.as_secs_f64(), max,
			"Testing DNS resolution for at least {} seconds with {} concurrent lookups",
			duration.as_secs_f64(), max
		);

		loop {
			if let Evaluation::Failed(diag) = self.play_round(session, max).await {
				session.verdict = Verdict::FailedAt(diag);
				return;
			}
			if session.elapsed() >= duration {
				break;
			}
			self.pause().await;
		}

		session.verdict = Verdict::PassedThrough(max);
		info!(
			rounds = session.rounds, max,
			"DNS resolution happened {} times with {} concurrent lookups each in {:.2} seconds",
			session.rounds, max, session.elapsed().as_secs_f64()
		);
	}

	/// Dispatch one round and evaluate it.
	async fn play_round(&self, session: &mut TestSession, concurrency: usize) -> Evaluation {
		session.rounds += 1;
		session.concurrency = concurrency;
		info!(round = session.rounds, concurrency, "round started");

		let result = dispatch(
			&self.lookup, concurrency, &self.config.domain, self.nameserver.as_deref(),
		).await;
		session.history.record(summarize(session.rounds, &result, session.started));

		let evaluation = evaluate(&result, session.started);
		match &evaluation {
			Evaluation::Passed => {
				info!(round = session.rounds, concurrency, "round passed");
			}
			Evaluation::Failed(diag) => {
				error!(
					round = session.rounds,
					concurrency = diag.concurrency,
					failed = diag.failed,
					elapsed_secs = diag.elapsed.as_secs_f64(),
					cause = %diag.cause,
					"DNS resolution failed at {} concurrent requests after {:.2} seconds with {}",
					diag.concurrency, diag.elapsed.as_secs_f64(), diag.cause
				);
			}
		}
		evaluation
	}

	async fn pause(&self) {
		if !self.config.wait.is_zero() {
			tokio::time::sleep(self.config.wait).await;
		}
	}
}
