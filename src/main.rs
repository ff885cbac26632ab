use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use nameinator::cli::Cli;
use nameinator::dns::UdpExchanger;
use nameinator::{domains, logging, output, resolver, stats};
use nameinator::{BenchmarkRunner, DomainStore, NameserverStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init(cli.debug);

	let prepare = cli.prepare_config();
	let config = cli.benchmark_config();
	output::print_welcome(&prepare, &config);

	// Preparation: fill both stores once before the run
	let ns_store = NameserverStore::new();
	let d_store = DomainStore::new();
	resolver::prepare_nameservers(&ns_store, &prepare)?;
	domains::prepare_domains(&d_store, &prepare)?;

	println!("Benchmarking {} nameservers with {} domains...", ns_store.len(), d_store.len());
	let bar = ProgressBar::new((ns_store.len() * d_store.len()) as u64);
	bar.set_style(
		ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] eta {eta}")?
	);

	let runner = BenchmarkRunner::new(UdpExchanger::new(config.timeout), config);
	runner.run(&d_store, &ns_store, &bar).await?;
	bar.finish();

	let results = stats::rank_nameservers(&ns_store.snapshot());
	output::print_results_table(&results);
	if cli.debug {
		output::print_debug_records(&ns_store, &results);
	}

	if let Some(path) = &cli.output {
		output::write_csv(path, &results)?;
	}

	output::print_bye();
	Ok(())
}
