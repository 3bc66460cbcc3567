use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use crate::config::{LoadConfig, LoadMode};
use crate::stats::RoundSummary;

/// Print a summary of the load test configuration before running.
pub fn print_config_summary(config: &LoadConfig, nameserver: Option<&str>) {
	println!("DNS Load Test Configuration");
	println!("===========================");
	println!("Domain:         {}", config.domain);
	println!("Max lookups:    {}", config.max);
	match config.mode {
		LoadMode::Ramp { step } => println!("Mode:           ramp (step {})", step),
		LoadMode::Duration(d) => println!("Mode:           duration ({} s)", d.as_secs()),
	}
	println!("Wait:           {:.2} s", config.wait.as_secs_f64());
	match nameserver {
		Some(ns) => {
			println!("Nameserver:     {} (raw)", ns);
			println!("Timeout:        {} ms", config.timeout.as_millis());
		}
		None => println!("Nameserver:     system resolver"),
	}
	println!();
}

/// Format the rounds a row covers as "N" or "first-last".
fn format_rounds(summary: &RoundSummary) -> String {
	if summary.first_round == summary.last_round {
		format!("{}", summary.first_round)
	} else {
		format!("{}-{}", summary.first_round, summary.last_round)
	}
}

/// Format failure counts as "kind=count" pairs.
fn format_breakdown(summary: &RoundSummary) -> String {
	if summary.breakdown.is_empty() {
		return "-".to_string();
	}
	summary.breakdown.iter()
		.map(|(kind, count)| format!("{}={}", kind, count))
		.collect::<Vec<_>>()
		.join(", ")
}

/// Print the per-round history as a formatted table.
pub fn print_round_table(history: &[RoundSummary]) {
	if history.is_empty() {
		return;
	}

	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Rounds", "Concurrency", "Resolved", "Failed", "Failures", "Elapsed",
	]);

	for r in history {
		table.add_row(vec![
			format_rounds(r),
			format!("{}", r.concurrency),
			format!("{}", r.resolved),
			format!("{}", r.failed),
			format_breakdown(r),
			format!("{:.2} s", r.elapsed.as_secs_f64()),
		]);
	}

	println!("\nRound Results");
	println!("=============\n");
	println!("{table}");
}
