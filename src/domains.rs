use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::dns::is_valid_domain;
use crate::dstore::DomainStore;
use crate::transport::PrepareConfig;

/// Project-local domain lists, checked in order before the per-user one
const LOCAL_DOMAIN_FILES: &[&str] = &["datasrc/domains.txt", "datasrc/alexa-top-2000-domains.txt"];

/// Return a built-in pool of popular and diverse domains.
///
/// Mixes heavily cached names with institutional and ccTLD names so a random
/// sample exercises both cache hits and real recursion.
pub fn default_domains() -> Vec<String> {
	vec![
		// Popular, likely cached
		"google.com",
		"youtube.com",
		"facebook.com",
		"amazon.com",
		"wikipedia.org",
		"twitter.com",
		"reddit.com",
		"netflix.com",
		"microsoft.com",
		"apple.com",
		"github.com",
		"cloudflare.com",
		"instagram.com",
		"linkedin.com",
		"bing.com",
		"yahoo.com",
		"stackoverflow.com",
		"mozilla.org",
		"ebay.com",
		"twitch.tv",
		// Government and institutional
		"archives.gov",
		"usgs.gov",
		"noaa.gov",
		"census.gov",
		"nist.gov",
		"loc.gov",
		"si.edu",
		"mit.edu",
		"stanford.edu",
		"caltech.edu",
		// International research
		"cern.ch",
		"ethz.ch",
		"mpg.de",
		"cnrs.fr",
		"inria.fr",
		"csiro.au",
		"anu.edu.au",
		"cam.ac.uk",
		"ox.ac.uk",
		"tudelft.nl",
		// Country-code TLD variety
		"ibge.gov.br",
		"kb.se",
		"nla.gov.au",
		"ndl.go.jp",
		"keio.ac.jp",
		"snu.ac.kr",
		"iitb.ac.in",
		"natlib.govt.nz",
		"ubc.ca",
		"unam.mx",
		"uct.ac.za",
		"uio.no",
		"ku.dk",
		"oulu.fi",
		"tcd.ie",
		"ulisboa.pt",
		// Less common TLDs
		"crates.io",
		"pkg.dev",
		"web.app",
		"lobste.rs",
		"arxiv.org",
		"archive.org",
		"gutenberg.org",
		"icann.org",
		"iana.org",
		"ietf.org",
		// Regional media
		"rtve.es",
		"yle.fi",
		"dr.dk",
		"nrk.no",
		"svt.se",
		"srf.ch",
		"orf.at",
		"vrt.be",
		"rte.ie",
		"bbc.co.uk",
		"lemonde.fr",
		"spiegel.de",
		"corriere.it",
		"elpais.com",
		"nos.nl",
		"abc.net.au",
		"cbc.ca",
		"nhk.or.jp",
		"kbs.co.kr",
		// Commerce and services
		"booking.com",
		"airbnb.com",
		"paypal.com",
		"spotify.com",
		"dropbox.com",
		"zoom.us",
		"salesforce.com",
		"adobe.com",
		"oracle.com",
		"ibm.com",
		"samsung.com",
		"sony.com",
		"ikea.com",
		"zalando.de",
		"rakuten.co.jp",
		"mercadolibre.com.ar",
		"alibaba.com",
		"yandex.ru",
		"naver.com",
		"baidu.com",
		// Developer infrastructure
		"gitlab.com",
		"bitbucket.org",
		"npmjs.com",
		"pypi.org",
		"rust-lang.org",
		"python.org",
		"kernel.org",
		"debian.org",
		"ubuntu.com",
		"fedoraproject.org",
	].into_iter().map(String::from).collect()
}

/// Read domains from a file, one per line.
///
/// Blank lines and lines starting with '#' are skipped, as are names that
/// cannot be put into a DNS query.
pub fn read_domain_file(path: &Path) -> Result<Vec<String>> {
	let content = std::fs::read_to_string(path)
		.map_err(|e| anyhow!("failed to read domain file '{}': {}", path.display(), e))?;
	let domains: Vec<String> = content.lines()
		.map(|line| line.trim().to_string())
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.filter(|line| {
			let valid = is_valid_domain(line);
			if !valid {
				warn!(path = %path.display(), domain = line.as_str(), "skipping invalid domain");
			}
			valid
		})
		.collect();
	Ok(domains)
}

/// Turn a domain into its fully-qualified form with a trailing dot.
pub fn to_fqdn(domain: &str) -> String {
	let trimmed = domain.trim();
	if trimmed.ends_with('.') {
		trimmed.to_string()
	} else {
		format!("{}.", trimmed)
	}
}

/// Shuffle the pool and keep the first `count` entries as FQDNs.
///
/// Duplicates are dropped before sampling. A fixed seed gives a
/// reproducible selection.
pub fn sample_domains(pool: &[String], count: usize, seed: Option<u64>) -> Vec<String> {
	let mut fqdns: Vec<String> = pool.iter().map(|d| to_fqdn(d)).collect();
	fqdns.sort();
	fqdns.dedup();

	let mut rng = match seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};
	fqdns.shuffle(&mut rng);

	if fqdns.len() < count {
		warn!(requested = count, available = fqdns.len(), "fewer domains available than requested");
	}
	fqdns.truncate(count);
	fqdns
}

/// Pick the domain list source: explicit file, project file, user file.
fn locate_domain_file(explicit: Option<&str>) -> Option<PathBuf> {
	if let Some(path) = explicit {
		return Some(PathBuf::from(path));
	}
	if let Some(local) = LOCAL_DOMAIN_FILES.iter().map(PathBuf::from).find(|p| p.exists()) {
		return Some(local);
	}
	let user = crate::resolver::user_config_dir()?.join("domains.txt");
	user.exists().then_some(user)
}

/// Load, sample and store the domains for this run.
pub fn prepare_domains(store: &DomainStore, config: &PrepareConfig) -> Result<()> {
	let pool = match locate_domain_file(config.domain_file.as_deref()) {
		Some(path) => {
			info!(path = %path.display(), "loading domains");
			read_domain_file(&path)?
		}
		None => {
			info!("using built-in domain list");
			default_domains()
		}
	};
	let selected = sample_domains(&pool, config.number_of_domains, config.seed);
	store.add_many(&selected);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_default_domains_are_unique() {
		let domains = default_domains();
		let mut sorted = domains.clone();
		sorted.sort();
		sorted.dedup();
		assert_eq!(sorted.len(), domains.len());
		assert!(domains.iter().all(|d| is_valid_domain(d)), "built-in list has an invalid name");
	}

	#[test]
	fn test_default_pool_covers_default_domain_count() {
		use clap::Parser;

		let config = crate::cli::Cli::try_parse_from(["nameinator"]).unwrap().prepare_config();
		let pool = default_domains();
		assert!(pool.len() >= config.number_of_domains);
		let sampled = sample_domains(&pool, config.number_of_domains, Some(11));
		assert_eq!(sampled.len(), config.number_of_domains);
	}

	#[test]
	fn test_default_domains_diverse_tlds() {
		let mut tlds: Vec<String> = default_domains().iter()
			.filter_map(|d| d.rsplit('.').next().map(String::from))
			.collect();
		tlds.sort();
		tlds.dedup();
		assert!(tlds.len() >= 15, "expected at least 15 unique TLDs, got {}", tlds.len());
	}

	#[test]
	fn test_to_fqdn() {
		assert_eq!(to_fqdn("example.com"), "example.com.");
		assert_eq!(to_fqdn("example.com."), "example.com.");
		assert_eq!(to_fqdn(" example.com \n"), "example.com.");
	}

	#[test]
	fn test_sample_is_reproducible_with_seed() {
		let pool = default_domains();
		let a = sample_domains(&pool, 10, Some(7));
		let b = sample_domains(&pool, 10, Some(7));
		assert_eq!(a, b);
		assert_eq!(a.len(), 10);
		assert!(a.iter().all(|d| d.ends_with('.')));
	}

	#[test]
	fn test_sample_caps_at_pool_size() {
		let pool = vec!["a.example".to_string(), "b.example".to_string(), "a.example.".to_string()];
		let sampled = sample_domains(&pool, 100, Some(1));
		assert_eq!(sampled.len(), 2);
	}

	#[test]
	fn test_read_domain_file_skips_comments_and_invalid_names() {
		let path = std::env::temp_dir().join(format!("nameinator-domains-{}.txt", std::process::id()));
		let mut file = std::fs::File::create(&path).unwrap();
		writeln!(file, "# popular").unwrap();
		writeln!(file, "example.com").unwrap();
		writeln!(file).unwrap();
		writeln!(file, "  example.org  ").unwrap();
		writeln!(file, "bad domain.example").unwrap();
		writeln!(file, "{}.com", "a".repeat(64)).unwrap();
		drop(file);

		let domains = read_domain_file(&path).unwrap();
		std::fs::remove_file(&path).unwrap();
		assert_eq!(domains, vec!["example.com", "example.org"]);
	}

	#[test]
	fn test_prepare_domains_from_file() {
		let path = std::env::temp_dir().join(format!("nameinator-prepare-{}.txt", std::process::id()));
		std::fs::write(&path, "one.example\ntwo.example\nthree.example\n").unwrap();

		let store = DomainStore::new();
		let config = PrepareConfig {
			number_of_domains: 2,
			domain_file: Some(path.to_string_lossy().into_owned()),
			seed: Some(3),
			..PrepareConfig::default()
		};
		prepare_domains(&store, &config).unwrap();
		std::fs::remove_file(&path).unwrap();
		assert_eq!(store.len(), 2);
	}
}
