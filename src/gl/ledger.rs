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

use crate::gl::entry::{Directive, Entry, DEFAULT_PROVIDER};
use crate::gl::price::PriceRecord;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::warn;

/// The central data structure of this system, which takes input from the
/// parser and answers the questions the pricing pipeline asks of it: which
/// prices exist, which prices should be fetched, which commodities exist and
/// which currencies the ledger reports in.
#[derive(Debug, Default)]
pub struct Ledger {
	entries: Vec<Entry>,
	operating_currencies: Vec<String>,
}

impl Ledger {
	pub fn new() -> Self {
		Default::default()
	}

	// -----------
	// -- INPUT --
	// -----------

	pub fn add_entry(&mut self, entry: Entry) {
		self.entries.push(entry);
	}

	/// Adds a currency to report in. Declaring one twice is harmless.
	pub fn declare_operating_currency(&mut self, currency: &str) {
		if !self.operating_currencies.iter().any(|c| c == currency) {
			self.operating_currencies.push(currency.to_string());
		}
	}

	// ------------
	// -- OUTPUT --
	// ------------

	pub fn entries(&self) -> &[Entry] {
		&self.entries
	}

	pub fn operating_currencies(&self) -> &[String] {
		&self.operating_currencies
	}

	/// Every price statement in the ledger, in the order written.
	pub fn price_records(&self) -> Vec<PriceRecord> {
		self.entries
			.iter()
			.filter_map(|e| match &e.directive {
				Directive::Price(p) => Some(p.clone()),
				_ => None,
			})
			.collect()
	}

	/// Every declared commodity symbol.
	pub fn commodities(&self) -> BTreeSet<String> {
		self.entries
			.iter()
			.filter_map(|e| match &e.directive {
				Directive::Commodity(c) => Some(c.currency.clone()),
				_ => None,
			})
			.collect()
	}

	/// One unresolved price per commodity that names a ticker, dated on the
	/// given day. Commodities whose source is a provider we cannot query are
	/// skipped with a warning.
	pub fn fetch_requests(&self, today: NaiveDate) -> Vec<PriceRecord> {
		let mut out = vec![];

		for entry in &self.entries {
			let commodity = match &entry.directive {
				Directive::Commodity(c) => c,
				_ => continue,
			};
			let source = match &commodity.price_source {
				Some(source) => source,
				None => continue,
			};

			if source.provider != DEFAULT_PROVIDER {
				warn!(
					"{}: unsupported price provider {} (line {})",
					commodity.currency, source.provider, entry.line
				);
				continue;
			}

			out.push(PriceRecord::unresolved(
				&commodity.currency,
				&source.quote,
				today,
				&source.ticker,
			));
		}

		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gl::entry::{Commodity, PriceSource};
	use crate::gl::price::Provenance;
	use rust_decimal_macros::dec;

	fn date(s: &str) -> NaiveDate {
		NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
	}

	fn commodity(currency: &str, source: Option<&str>) -> Directive {
		Directive::Commodity(Commodity {
			currency: currency.to_string(),
			price_source: source.map(|s| PriceSource::from_meta(s).unwrap()),
		})
	}

	fn sample() -> Ledger {
		let mut ledger = Ledger::new();
		ledger.add_entry(Entry::new(1, commodity("USD", None)));
		ledger.add_entry(Entry::new(2, commodity("FOO", Some("USD:FOO"))));
		ledger.add_entry(Entry::new(
			5,
			commodity("BTC", Some("USD:coinbase/BTC-USD")),
		));
		ledger.add_entry(Entry::new(
			8,
			Directive::Price(PriceRecord::new(
				"BAR",
				"USD",
				date("2024-01-02"),
				dec!(1.2),
				Provenance::default(),
			)),
		));
		ledger.add_entry(Entry::new(9, Directive::Other));
		ledger
	}

	#[test]
	fn test_price_records() {
		let prices = sample().price_records();
		assert_eq!(prices.len(), 1);
		assert_eq!(prices[0].base, "BAR");
	}

	#[test]
	fn test_commodities() {
		let all: Vec<String> = sample().commodities().into_iter().collect();
		assert_eq!(all, vec!["BTC", "FOO", "USD"]);
	}

	#[test]
	fn test_fetch_requests_skip_unsupported_providers() {
		let requests = sample().fetch_requests(date("2024-03-01"));
		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].base, "FOO");
		assert_eq!(requests[0].quote, "USD");
		assert_eq!(requests[0].source.as_deref(), Some("FOO"));
		assert_eq!(requests[0].date, date("2024-03-01"));
		assert!(!requests[0].is_resolved());
	}

	#[test]
	fn test_operating_currencies_deduplicated() {
		let mut ledger = Ledger::new();
		ledger.declare_operating_currency("USD");
		ledger.declare_operating_currency("EUR");
		ledger.declare_operating_currency("USD");
		assert_eq!(ledger.operating_currencies(), ["USD", "EUR"]);
	}
}
