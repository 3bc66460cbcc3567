use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::{ConfigError, LoadConfig};

const NAMESERVER_DIRECTIVE: &str = "nameserver";

/// Extract nameserver addresses from resolv.conf style content.
///
/// Lines starting with "nameserver" contribute the first token after the
/// directive; everything else is ignored. File order is kept and
/// duplicates are not removed.
pub fn parse_resolv_conf(content: &str) -> Vec<String> {
	let mut resolvers = Vec::new();
	for line in content.lines() {
		let line = line.trim_end();
		if !line.starts_with(NAMESERVER_DIRECTIVE) {
			continue;
		}
		let mut parts = line.split_whitespace();
		// Reject tokens that merely start with the directive, e.g. "nameservers"
		if parts.next() != Some(NAMESERVER_DIRECTIVE) {
			continue;
		}
		if let Some(addr) = parts.next() {
			resolvers.push(addr.to_string());
		}
	}
	resolvers
}

/// Read the nameserver list from a resolver configuration file.
///
/// Fails if the file cannot be read or names no nameserver.
pub fn list_resolvers(path: &Path) -> Result<Vec<String>, ConfigError> {
	let display = path.display().to_string();
	let content = std::fs::read_to_string(path)
		.map_err(|source| ConfigError::ResolverFileUnreadable {
			path: display.clone(),
			source,
		})?;
	let resolvers = parse_resolv_conf(&content);
	if resolvers.is_empty() {
		return Err(ConfigError::NoResolvers(display));
	}
	Ok(resolvers)
}

/// Pick one resolver uniformly at random.
pub fn pick_resolver<R: Rng + ?Sized>(resolvers: &[String], rng: &mut R) -> Option<String> {
	resolvers.choose(rng).cloned()
}

/// Decide which nameserver the whole test talks to.
///
/// Returns None for the system resolver path, the explicit nameserver when
/// one is configured, and otherwise a random entry from the resolver file.
pub fn select_nameserver<R: Rng + ?Sized>(
	config: &LoadConfig,
	rng: &mut R,
) -> Result<Option<String>, ConfigError> {
	if !config.raw {
		return Ok(None);
	}
	if let Some(ns) = &config.nameserver {
		return Ok(Some(ns.clone()));
	}
	let resolvers = list_resolvers(&config.resolv_conf)?;
	debug!(candidates = ?resolvers, "picking nameserver from resolver configuration");
	pick_resolver(&resolvers, rng)
		.map(Some)
		.ok_or_else(|| ConfigError::NoResolvers(config.resolv_conf.display().to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::LoadMode;
	use rand::rngs::StdRng;
	use rand::SeedableRng;
	use std::path::PathBuf;

	const RESOLV_CONF: &str = "\
# generated by resolvconf
search example.internal
nameserver 10.0.0.1
options edns0 trust-ad
nameserver\t\t2001:db8::53
nameserver   10.0.0.1   # duplicate kept
nameservers 192.0.2.99
domain example.internal
";

	fn temp_file(name: &str, content: &str) -> PathBuf {
		let path = std::env::temp_dir()
			.join(format!("dns-load-{}-{}", std::process::id(), name));
		std::fs::write(&path, content).unwrap();
		path
	}

	fn raw_config(resolv_conf: PathBuf) -> LoadConfig {
		let mut config = LoadConfig::new("example.com", 10, LoadMode::Ramp { step: 5 });
		config.raw = true;
		config.resolv_conf = resolv_conf;
		config
	}

	#[test]
	fn test_parse_keeps_file_order() {
		let resolvers = parse_resolv_conf(RESOLV_CONF);
		assert_eq!(resolvers, vec!["10.0.0.1", "2001:db8::53", "10.0.0.1"]);
	}

	#[test]
	fn test_parse_ignores_bare_directive() {
		assert!(parse_resolv_conf("nameserver\nnameserver   \n").is_empty());
	}

	#[test]
	fn test_list_resolvers_from_file() {
		let path = temp_file("list", RESOLV_CONF);
		let resolvers = list_resolvers(&path).unwrap();
		std::fs::remove_file(&path).ok();
		assert_eq!(resolvers.len(), 3);
		assert_eq!(resolvers[1], "2001:db8::53");
	}

	#[test]
	fn test_missing_file() {
		let result = list_resolvers(Path::new("/nonexistent/dns-load/resolv.conf"));
		assert!(matches!(result, Err(ConfigError::ResolverFileUnreadable { .. })));
	}

	#[test]
	fn test_file_without_nameservers() {
		let path = temp_file("empty", "search example.internal\n");
		let result = list_resolvers(&path);
		std::fs::remove_file(&path).ok();
		assert!(matches!(result, Err(ConfigError::NoResolvers(_))));
	}

	#[test]
	fn test_pick_is_deterministic_with_seed() {
		let resolvers: Vec<String> = (1..=8).map(|i| format!("10.0.0.{}", i)).collect();
		let a = pick_resolver(&resolvers, &mut StdRng::seed_from_u64(7));
		let b = pick_resolver(&resolvers, &mut StdRng::seed_from_u64(7));
		assert_eq!(a, b);
		assert!(resolvers.contains(&a.unwrap()));
	}

	#[test]
	fn test_pick_from_empty() {
		assert!(pick_resolver(&[], &mut StdRng::seed_from_u64(1)).is_none());
	}

	#[test]
	fn test_select_system_path() {
		let mut config = raw_config(PathBuf::from("/nonexistent"));
		config.raw = false;
		let ns = select_nameserver(&config, &mut StdRng::seed_from_u64(1)).unwrap();
		assert!(ns.is_none());
	}

	#[test]
	fn test_select_explicit_nameserver_skips_file() {
		let mut config = raw_config(PathBuf::from("/nonexistent"));
		config.nameserver = Some("192.0.2.53".to_string());
		let ns = select_nameserver(&config, &mut StdRng::seed_from_u64(1)).unwrap();
		assert_eq!(ns.as_deref(), Some("192.0.2.53"));
	}

	#[test]
	fn test_select_from_resolv_conf() {
		let path = temp_file("select", "nameserver 192.0.2.10\n");
		let config = raw_config(path.clone());
		let ns = select_nameserver(&config, &mut StdRng::seed_from_u64(3)).unwrap();
		std::fs::remove_file(&path).ok();
		assert_eq!(ns.as_deref(), Some("192.0.2.10"));
	}
}
