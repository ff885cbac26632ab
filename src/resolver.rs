use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::dns::parse_endpoint;
use crate::nsstore::NameserverStore;
use crate::transport::{PrepareConfig, ResolverConfig, DNS_PORT};

/// Label for the nameserver given on the command line
pub const GIVEN_BY_PARAMETER: &str = "givenByParameter";

/// Label and country tag for the operating system's resolver
pub const LOCALHOST_LABEL: &str = "localhost";
pub const LOCAL_COUNTRY: &str = "LOCAL";

/// Project-local nameserver list, checked before the per-user one
const LOCAL_NAMESERVER_FILE: &str = "datasrc/nameserver-globals.csv";

/// Per-user configuration directory (`~/.config/nameinator`).
pub fn user_config_dir() -> Option<PathBuf> {
	let home = std::env::var_os("HOME")?;
	Some(PathBuf::from(home).join(".config").join("nameinator"))
}

/// Parse a nameserver address into a ResolverConfig.
///
/// IP literals are normalized; anything else is kept verbatim as a hostname
/// and resolved when queried.
pub fn parse_resolver(input: &str, label: &str, country: &str) -> Result<ResolverConfig> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(anyhow!("empty resolver address"));
	}
	if trimmed.contains(char::is_whitespace) {
		return Err(anyhow!("invalid resolver address '{}'", trimmed));
	}

	let address = match parse_endpoint(trimmed) {
		Some(addr) if addr.port() == DNS_PORT => addr.ip().to_string(),
		Some(addr) => addr.to_string(),
		None => trimmed.to_string(),
	};
	Ok(ResolverConfig::new(address, label, country))
}

/// Read nameservers from a CSV file with rows `address,label[,country]`.
///
/// Blank lines and lines starting with '#' are skipped. A missing label
/// falls back to the address.
pub fn read_nameserver_file(path: &Path) -> Result<Vec<ResolverConfig>> {
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.comment(Some(b'#'))
		.trim(csv::Trim::All)
		.from_path(path)
		.map_err(|e| anyhow!("failed to read nameserver file '{}': {}", path.display(), e))?;

	let mut resolvers = Vec::new();
	for (line, row) in reader.records().enumerate() {
		let row = row.map_err(|e| anyhow!("{}: line {}: {}", path.display(), line + 1, e))?;
		let address = row.get(0).unwrap_or_default();
		if address.is_empty() {
			continue;
		}
		let label = row.get(1).filter(|l| !l.is_empty()).unwrap_or(address);
		let country = row.get(2).unwrap_or_default();
		resolvers.push(parse_resolver(address, label, country)?);
	}
	Ok(resolvers)
}

/// Discover the operating system's default resolver.
///
/// Returns None if the system configuration cannot be read or lists no
/// nameservers.
pub fn system_resolver() -> Option<ResolverConfig> {
	let (config, _opts) = match hickory_resolver::system_conf::read_system_conf() {
		Ok(conf) => conf,
		Err(e) => {
			warn!(error = %e, "could not read system resolver configuration");
			return None;
		}
	};
	let addr = config.name_servers().first()?.socket_addr;
	parse_resolver(&addr.to_string(), LOCALHOST_LABEL, LOCAL_COUNTRY).ok()
}

/// Return a list of well-known public resolvers.
pub fn default_resolvers() -> Vec<ResolverConfig> {
	[
		("1.1.1.1", "Cloudflare", "US"),
		("1.0.0.1", "Cloudflare", "US"),
		("8.8.8.8", "Google", "US"),
		("8.8.4.4", "Google", "US"),
		("9.9.9.9", "Quad9", "CH"),
		("149.112.112.112", "Quad9", "CH"),
		("208.67.222.222", "OpenDNS", "US"),
		("208.67.220.220", "OpenDNS", "US"),
		("94.140.14.14", "AdGuard", "CY"),
		("76.76.2.0", "ControlD", "CA"),
		("185.222.222.222", "DNS.SB", "DE"),
		("194.242.2.2", "Mullvad", "SE"),
	]
	.into_iter()
	.map(|(address, label, country)| ResolverConfig::new(address, label, country))
	.collect()
}

/// Pick the nameserver list source: explicit file, project file, user file.
fn locate_nameserver_file(explicit: Option<&str>) -> Option<PathBuf> {
	if let Some(path) = explicit {
		return Some(PathBuf::from(path));
	}
	let local = PathBuf::from(LOCAL_NAMESERVER_FILE);
	if local.exists() {
		return Some(local);
	}
	let user = user_config_dir()?.join("nameserver-globals.csv");
	user.exists().then_some(user)
}

/// Collect the nameservers for this run and load them into the store.
///
/// A single `--nameserver` replaces the list; with contest mode the system
/// resolver competes as well.
pub fn prepare_nameservers(store: &NameserverStore, config: &PrepareConfig) -> Result<()> {
	let mut resolvers = Vec::new();

	if config.contest {
		match system_resolver() {
			Some(local) => resolvers.push(local),
			None => warn!("no system resolver found; contest runs without it"),
		}
	}

	if let Some(nameserver) = &config.nameserver {
		resolvers.push(parse_resolver(nameserver, GIVEN_BY_PARAMETER, LOCAL_COUNTRY)?);
	} else {
		match locate_nameserver_file(config.nameserver_file.as_deref()) {
			Some(path) => {
				info!(path = %path.display(), "loading nameservers");
				resolvers.extend(read_nameserver_file(&path)?);
			}
			None => {
				info!("using built-in nameserver list");
				resolvers.extend(default_resolvers());
			}
		}
	}

	for r in &resolvers {
		store.add_or_update(&r.address, &r.label, &r.country);
	}
	Ok(())
}
