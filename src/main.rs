/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use crate::config::config_file::Config;
use crate::gl::ledger::Ledger;
use crate::gl::new_entries::new_entries;
use crate::gl::price::PriceRecord;
use crate::gl::price_graph::PriceGraph;
use crate::gl::projector::Projector;
use crate::import::quotes::fetch_all;
use crate::import::yahoo::YahooClient;
use crate::parsing::filesystem::Filesystem;
use crate::reports::formatter::Formatter;
use crate::reports::rate_reporter::RateReporter;
use crate::reports::splicer::{merge, PriceLineIndex, Splicer};
use anyhow::{anyhow, Error};
use chrono::Local;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod gl;
mod import;
mod parsing;
mod reports;
mod util;

#[derive(Parser)]
#[command(
	name = "pricer",
	version,
	about = "Keeps the price statements of a plain text ledger current"
)]
struct Cli {
	// ----------------
	// -- POSITIONAL --
	// ----------------
	/// The ledger file to update
	file: PathBuf,

	// -----------
	// -- FLAGS --
	// -----------
	/// Print the updated ledger instead of rewriting the file
	#[arg(long)]
	dry_run: bool,

	/// Do not look up prices; only derive from what the ledger has
	#[arg(long)]
	offline: bool,

	/// Also derive prices in this currency (repeatable)
	#[arg(short, long)]
	currency: Vec<String>,

	/// Print every known and derived rate instead of the ledger
	#[arg(long)]
	rates: bool,

	/// Custom config file location (default: ~/.config/pricer/config.toml)
	#[arg(long)]
	config: Option<PathBuf>,

	/// More logging; repeat for even more
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,
}

fn main() -> Result<(), Error> {
	let args = Cli::parse();
	init_logging(args.verbose);

	let fs = Filesystem::new();
	let config = fs.get_config(args.config.as_deref())?;
	let text = fs.read_ledger(&args.file)?;

	let mut ledger = Ledger::new();
	let parse_result = parsing::parser::Parser::new()
		.parse(&text, &mut ledger)
		.map_err(|e| anyhow!("{}: {}", args.file.display(), e))?;
	info!(
		"read {} lines: {} prices, {} commodities",
		parse_result.lines, parse_result.prices, parse_result.commodities
	);

	for currency in config.operating_currencies().iter().chain(&args.currency) {
		ledger.declare_operating_currency(currency);
	}

	// Must be taken before anything else touches the ledger
	let index = PriceLineIndex::capture(ledger.entries());

	let fetched = if args.offline {
		vec![]
	} else {
		fetch(&config, &ledger)?
	};

	// Derived statements from earlier runs are rewritten, not trusted
	let existing = ledger.price_records();
	let observed = PriceGraph::from_records(&merge(
		existing
			.iter()
			.filter(|r| !r.provenance.is_projected())
			.cloned()
			.collect(),
		fetched.clone(),
	));
	let projected = Projector::new(ledger.operating_currencies())
		.project(&observed, &ledger.commodities());

	if args.rates {
		let reporter = RateReporter::new(projected.take_all_rates());
		print!("{}", reporter.render_all_rates());
		return Ok(());
	}

	let derived =
		new_entries(&projected, &observed, ledger.operating_currencies());
	info!("derived {} new prices", derived.len());

	let mut fresh = fetched;
	fresh.extend(derived);
	let block = merge(existing, fresh);

	let mut output =
		Splicer::new(config.date_format()).splice(&text, &index, &block);
	if index.is_empty() {
		info!("no price statements to replace; leaving the ledger as is");
	} else {
		info!("replaced {} price lines", index.len());
		if config.align() {
			output = Formatter::new().align(&output);
		}
	}

	if args.dry_run {
		print!("{}", output);
	} else if output == text {
		info!("{} is already up to date", args.file.display());
	} else {
		fs.write_ledger(&args.file, &output)?;
		info!("wrote {}", args.file.display());
	}

	Ok(())
}

/// Looks up every commodity that names a ticker. Only the lookups that
/// succeeded are returned; failures have already been logged.
fn fetch(config: &Config, ledger: &Ledger) -> Result<Vec<PriceRecord>, Error> {
	let requests = ledger.fetch_requests(Local::now().date_naive());
	if requests.is_empty() {
		return Ok(vec![]);
	}

	let client = YahooClient::new(
		config.api_url(),
		config.timeout(),
		config.user_agent(),
	)?;

	Ok(fetch_all(&client, requests, config.precision())
		.into_iter()
		.filter(PriceRecord::is_resolved)
		.collect())
}

/// Logs go to stderr so that a dry run prints nothing but the ledger.
/// RUST_LOG, when set, wins over the verbosity flag.
fn init_logging(verbosity: u8) {
	let default_level = match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}
