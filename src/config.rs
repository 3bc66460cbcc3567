use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reply timeout for raw lookups unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolver configuration read when raw mode has no explicit nameserver
pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Errors detected before any lookup is sent
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("domain must not be empty")]
	EmptyDomain,

	#[error("max must be a positive integer")]
	ZeroMax,

	#[error("step must be a positive integer")]
	ZeroStep,

	#[error("step {step} is larger than max {max}")]
	StepExceedsMax { step: usize, max: usize },

	#[error("max {max} must be divisible by step {step}")]
	StepNotDivisor { step: usize, max: usize },

	#[error("exactly one of duration or step is required")]
	MissingMode,

	#[error("duration must be a positive number of seconds")]
	ZeroDuration,

	#[error("wait must be a non-negative number of seconds, got {0}")]
	InvalidWait(f64),

	#[error("timeout must be positive")]
	ZeroTimeout,

	#[error("specifying NS only works in RAW mode")]
	NameserverWithoutRaw,

	#[error("failed to read resolver configuration '{path}': {source}")]
	ResolverFileUnreadable {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("no nameserver entries found in '{0}'")]
	NoResolvers(String),
}

/// How concurrency evolves across rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
	/// Start at `step`, add `step` after each passing round up to max
	Ramp { step: usize },
	/// Hold concurrency at max until the duration has elapsed
	Duration(Duration),
}

/// Validated configuration for one load test run
#[derive(Debug, Clone)]
pub struct LoadConfig {
	pub domain: String,
	pub max: usize,
	pub mode: LoadMode,
	pub wait: Duration,
	pub raw: bool,
	pub nameserver: Option<String>,
	pub timeout: Duration,
	pub resolv_conf: PathBuf,
}

impl LoadConfig {
	/// Build a config with defaults for everything but domain, max and mode.
	pub fn new(domain: &str, max: usize, mode: LoadMode) -> Self {
		LoadConfig {
			domain: domain.to_string(),
			max,
			mode,
			wait: Duration::ZERO,
			raw: false,
			nameserver: None,
			timeout: DEFAULT_TIMEOUT,
			resolv_conf: PathBuf::from(DEFAULT_RESOLV_CONF),
		}
	}

	/// Check the shape invariants the load controller relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.domain.trim().is_empty() {
			return Err(ConfigError::EmptyDomain);
		}
		if self.max == 0 {
			return Err(ConfigError::ZeroMax);
		}
		match self.mode {
			LoadMode::Ramp { step } => {
				if step == 0 {
					return Err(ConfigError::ZeroStep);
				}
				if step > self.max {
					return Err(ConfigError::StepExceedsMax { step, max: self.max });
				}
				if self.max % step != 0 {
					return Err(ConfigError::StepNotDivisor { step, max: self.max });
				}
			}
			LoadMode::Duration(d) => {
				if d.is_zero() {
					return Err(ConfigError::ZeroDuration);
				}
			}
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		if self.nameserver.is_some() && !self.raw {
			return Err(ConfigError::NameserverWithoutRaw);
		}
		Ok(())
	}
}

/// Convert a wait interval in seconds, rejecting negative or non-finite values.
pub fn wait_from_secs(secs: f64) -> Result<Duration, ConfigError> {
	if !secs.is_finite() || secs < 0.0 {
		return Err(ConfigError::InvalidWait(secs));
	}
	Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidWait(secs))
}
