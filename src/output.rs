use std::time::Duration;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::nsstore::NameserverStore;
use crate::stats::RankedNameserver;
use crate::transport::{BenchmarkConfig, PrepareConfig};

/// Print the startup banner and the effective configuration.
pub fn print_welcome(prepare: &PrepareConfig, bench: &BenchmarkConfig) {
	println!("starting NAMEinator - version {}", env!("CARGO_PKG_VERSION"));
	println!("OS: {} ARCH: {}", std::env::consts::OS, std::env::consts::ARCH);
	println!("-------------");
	println!("Domains:        {}", prepare.number_of_domains);
	match &prepare.nameserver {
		Some(ns) => println!("Nameserver:     {}", ns),
		None => println!("Nameservers:    {}", prepare.nameserver_file.as_deref().unwrap_or("default list")),
	}
	println!("Contest:        {}", if prepare.contest { "yes" } else { "no" });
	println!("Timeout:        {} ms", bench.timeout.as_millis());
	println!("Concurrency:    {}", bench.max_inflight);
	if let Some(seed) = prepare.seed {
		println!("Seed:           {}", seed);
	}
	println!("-------------");
}

fn format_ms(value: Option<Duration>) -> String {
	match value {
		Some(d) => format!("{:.1} ms", d.as_secs_f64() * 1000.0),
		None => "-".to_string(),
	}
}

fn rank_label(r: &RankedNameserver) -> String {
	r.tie_group.clone().unwrap_or_else(|| r.rank.to_string())
}

/// Print the ranked results as a formatted table.
pub fn print_results_table(results: &[RankedNameserver]) {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Rank", "Nameserver", "Label", "Country",
		"Avg", "Min", "Max", "Stddev",
		"Queries", "Timeouts", "Conn. errors", "Invalid",
	]);

	for r in results {
		let rec = &r.record;
		table.add_row(vec![
			rank_label(r),
			rec.address.clone(),
			rec.label.clone(),
			rec.country.clone(),
			format_ms(rec.rtt.mean()),
			format_ms(rec.rtt.min()),
			format_ms(rec.rtt.max()),
			rec.rtt.stddev_ms().map(|s| format!("{:.1} ms", s)).unwrap_or_else(|| "-".to_string()),
			rec.query_count.to_string(),
			rec.timeouts.to_string(),
			rec.connection_errors.to_string(),
			rec.validation_errors.to_string(),
		]);
	}

	println!();
	println!("finished - presenting results:");
	println!("{table}");
}

/// Print the raw store record of every ranked nameserver.
pub fn print_debug_records(store: &NameserverStore, results: &[RankedNameserver]) {
	println!();
	for r in results {
		if let Some(record) = store.get(&r.record.address) {
			println!("DEBUG: {:?}", record);
		}
	}
}

pub fn print_bye() {
	println!();
	println!("Au revoir!");
}

/// Write ranked results to a CSV file.
pub fn write_csv(path: &str, results: &[RankedNameserver]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;
	write_records(&mut writer, results)?;
	writer.flush()?;
	println!("\nResults written to: {}", path);
	Ok(())
}

fn write_records<W: std::io::Write>(writer: &mut csv::Writer<W>, results: &[RankedNameserver]) -> Result<()> {
	writer.write_record([
		"rank", "tie_group", "address", "label", "country",
		"mean_ms", "min_ms", "max_ms", "stddev_ms",
		"query_count", "timeouts", "connection_errors", "validation_errors",
	])?;

	let ms = |d: Option<Duration>| {
		d.map(|d| format!("{:.2}", d.as_secs_f64() * 1000.0)).unwrap_or_default()
	};
	for r in results {
		let rec = &r.record;
		writer.write_record([
			r.rank.to_string(),
			r.tie_group.clone().unwrap_or_default(),
			rec.address.clone(),
			rec.label.clone(),
			rec.country.clone(),
			ms(rec.rtt.mean()),
			ms(rec.rtt.min()),
			ms(rec.rtt.max()),
			rec.rtt.stddev_ms().map(|s| format!("{:.2}", s)).unwrap_or_default(),
			rec.query_count.to_string(),
			rec.timeouts.to_string(),
			rec.connection_errors.to_string(),
			rec.validation_errors.to_string(),
		])?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::nsstore::NameserverRecord;
	use crate::stats::rank_nameservers;

	#[test]
	fn test_csv_rows() {
		let mut fast = NameserverRecord::new("1.1.1.1", "Cloudflare", "US");
		fast.rtt.add(Duration::from_millis(10));
		fast.query_count = 1;
		let mut dead = NameserverRecord::new("10.0.0.1", "dead", "");
		dead.connection_errors = 3;
		let ranked = rank_nameservers(&[dead, fast]);

		let mut writer = csv::Writer::from_writer(Vec::new());
		write_records(&mut writer, &ranked).unwrap();
		let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
		let lines: Vec<&str> = data.lines().collect();

		assert_eq!(lines.len(), 3);
		assert!(lines[0].starts_with("rank,tie_group,address"));
		assert_eq!(lines[1], "1,,1.1.1.1,Cloudflare,US,10.00,10.00,10.00,0.00,1,0,0,0");
		assert_eq!(lines[2], "2,,10.0.0.1,dead,,,,,,0,0,3,0");
	}

	#[test]
	fn test_format_ms() {
		assert_eq!(format_ms(Some(Duration::from_micros(12_340))), "12.3 ms");
		assert_eq!(format_ms(None), "-");
	}
}
