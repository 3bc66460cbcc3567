use tracing_subscriber::EnvFilter;

/// Set up logging for the load test.
///
/// Defaults to INFO, or DEBUG with `--verbose`. The RUST_LOG environment
/// variable overrides both, e.g. RUST_LOG=dns_load=trace.
pub fn init_logging(verbose: bool) {
	let default = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_thread_ids(true)
		.try_init()
		.ok();
}
