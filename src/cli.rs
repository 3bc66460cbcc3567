use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};

use crate::config::{self, ConfigError, LoadConfig, LoadMode};

/// DNS load tool
#[derive(Parser, Debug)]
#[command(name = "dns-load")]
#[command(about = "Find how many concurrent DNS lookups a resolver sustains")]
#[command(group(ArgGroup::new("mode").required(true).args(["duration", "step"])))]
pub struct Cli {
	/// Domain to lookup
	#[arg(long = "domain")]
	pub domain: String,

	/// Max concurrent lookups
	#[arg(long = "max", default_value = "100")]
	pub max: usize,

	/// For how long to load test, in seconds
	#[arg(long = "duration")]
	pub duration: Option<u64>,

	/// Step size for ramping up concurrency
	#[arg(long = "step")]
	pub step: Option<usize>,

	/// Time to wait between lookup rounds, in seconds
	#[arg(long = "wait", default_value = "0")]
	pub wait: f64,

	/// Perform RAW DNS lookups, bypass system libraries
	#[arg(long = "raw")]
	pub raw: bool,

	/// Nameserver to query when doing RAW lookups (default: resolv.conf)
	#[arg(long = "ns")]
	pub ns: Option<String>,

	/// Reply timeout for RAW lookups in milliseconds
	#[arg(short = 't', long = "timeout", default_value = "5000")]
	pub timeout: u64,

	/// Resolver configuration to pick a nameserver from
	#[arg(long = "resolv-conf", default_value = config::DEFAULT_RESOLV_CONF)]
	pub resolv_conf: PathBuf,

	/// Random seed for nameserver selection
	#[arg(short = 's', long = "seed")]
	pub seed: Option<u64>,

	/// Verbose logging
	#[arg(short = 'v', long = "verbose")]
	pub verbose: bool,
}

impl Cli {
	/// Turn parsed flags into a validated load configuration.
	pub fn to_config(&self) -> Result<LoadConfig, ConfigError> {
		let mode = match (self.duration, self.step) {
			(Some(secs), _) => LoadMode::Duration(Duration::from_secs(secs)),
			(None, Some(step)) => LoadMode::Ramp { step },
			(None, None) => return Err(ConfigError::MissingMode),
		};
		let mut config = LoadConfig::new(self.domain.trim(), self.max, mode);
		config.wait = config::wait_from_secs(self.wait)?;
		config.raw = self.raw;
		config.nameserver = self.ns.clone();
		config.timeout = Duration::from_millis(self.timeout);
		config.resolv_conf = self.resolv_conf.clone();
		config.validate()?;
		Ok(config)
	}
}
