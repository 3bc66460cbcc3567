use std::sync::Arc;

use tokio::sync::Barrier;
use tracing::{debug, warn};

use crate::lookup::Lookup;
use crate::outcome::{LookupError, LookupOutcome, RoundResult};

/// Run `concurrency` identical lookups at once and wait for all of them.
///
/// Every worker gets its own task; a barrier releases them together so the
/// lookups hit the nameserver as one burst. Outcomes are returned in spawn
/// order, one per worker, whatever their completion order. A worker that
/// aborts is reported as an unexpected failure in its own slot.
pub async fn dispatch<L: Lookup>(
	lookup: &Arc<L>,
	concurrency: usize,
	domain: &str,
	nameserver: Option<&str>,
) -> RoundResult {
	debug!(
		nameserver = nameserver.unwrap_or("system"),
		concurrency,
		"testing DNS resolution"
	);

	let gate = Arc::new(Barrier::new(concurrency));
	let domain: Arc<str> = Arc::from(domain);
	let nameserver: Option<Arc<str>> = nameserver.map(Arc::from);

	let mut handles = Vec::with_capacity(concurrency);
	for _ in 0..concurrency {
		let lookup = Arc::clone(lookup);
		let gate = Arc::clone(&gate);
		let domain = Arc::clone(&domain);
		let nameserver = nameserver.clone();

		handles.push(tokio::spawn(async move {
			gate.wait().await;
			lookup.resolve(nameserver.as_deref(), &domain).await
		}));
	}

	let mut outcomes = Vec::with_capacity(concurrency);
	for handle in handles {
		match handle.await {
			Ok(outcome) => outcomes.push(outcome),
			Err(e) => {
				warn!("lookup worker failed: {}", e);
				outcomes.push(LookupOutcome::Failed(LookupError::Unexpected(
					format!("lookup worker failed: {}", e),
				)));
			}
		}
	}

	RoundResult { concurrency, outcomes }
}
