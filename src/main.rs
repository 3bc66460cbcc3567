mod bench;
mod cli;
mod config;
mod dns;
mod logging;
mod lookup;
mod outcome;
mod output;
mod pool;
mod resolver;
mod stats;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;
use tracing::info;

use crate::bench::{LoadController, Verdict};
use crate::cli::Cli;
use crate::lookup::QueryEngine;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	// Elapsed time in every report is measured from here
	let started = Instant::now();
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	// Reject bad flag combinations before touching the network
	let config = cli.to_config()?;

	// One nameserver for the whole test, reproducible with --seed
	let mut rng = match cli.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};
	let nameserver = resolver::select_nameserver(&config, &mut rng)?;
	if let Some(ns) = &nameserver {
		info!(nameserver = %ns, "using nameserver for raw lookups");
	}

	output::print_config_summary(&config, nameserver.as_deref());

	let engine = Arc::new(QueryEngine::new(config.timeout));
	let controller = LoadController::new(&config, engine, nameserver);
	let session = controller.run(started).await?;

	output::print_round_table(session.history.rows());

	info!(rounds = session.rounds, concurrency = session.concurrency, "load test finished");
	if session.passed() {
		return Ok(ExitCode::SUCCESS);
	}
	if let Verdict::FailedAt(diag) = &session.verdict {
		eprintln!(
			"DNS resolution failed at {} concurrent requests after {:.2} seconds with {}",
			diag.concurrency, diag.elapsed.as_secs_f64(), diag.cause,
		);
	}
	Ok(ExitCode::FAILURE)
}
