/* Copyright © 2024-2025 Adam Train <adam@adamtrain.net>
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
use crate::gl::entry::{Commodity, Directive, Entry, PriceSource};
use crate::gl::ledger::Ledger;
use crate::gl::price::{PriceRecord, Provenance};
use anyhow::{anyhow, bail, Error};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Dated directives that carry nothing this tool needs
const IGNORED_DIRECTIVES: [&str; 10] = [
	"open", "close", "balance", "pad", "note", "document", "event", "query",
	"custom", "txn",
];

/// Undated directives that carry nothing this tool needs, other than the
/// operating currency options
const IGNORED_KEYWORDS: [&str; 7] = [
	"option", "plugin", "include", "pushtag", "poptag", "pushmeta", "popmeta",
];

/// Reads the subset of beancount syntax that matters for pricing. Anything
/// else that is well-formed enough to recognize is kept as
/// [`Directive::Other`] so that its line number is still accounted for.
pub struct Parser {
	directive_regex: Regex,
	price_regex: Regex,
	metadata_regex: Regex,
	option_regex: Regex,
}

impl Parser {
	pub fn new() -> Self {
		Self {
			directive_regex: Regex::new(
				r"^(\d{4}[-/]\d{1,2}[-/]\d{1,2})\s+(\S+)(.*)$",
			)
			.unwrap(),
			price_regex: Regex::new(
				r"^\s+(\S+)\s+(-?[\d,]*\.?\d+)\s+([A-Z][A-Z0-9'._-]*)\s*(?:;(.*))?$",
			)
			.unwrap(),
			metadata_regex: Regex::new(r"^\s+([a-z][\w-]*):\s*(.*?)\s*$")
				.unwrap(),
			option_regex: Regex::new(r#"^option\s+"([^"]*)"\s+"([^"]*)""#)
				.unwrap(),
		}
	}

	/// Parses the text of a ledger into the passed Ledger. Every entry keeps
	/// the 1-based line it starts on, which is what lets the price block be
	/// spliced back into the same text later.
	pub fn parse(
		&self,
		content: &str,
		ledger: &mut Ledger,
	) -> Result<ParseResult, Error> {
		let mut output = ParseResult::default();

		// Commodity being assembled; its metadata follows on indented lines
		let mut pending: Option<(usize, Commodity)> = None;

		for (i, line) in content.lines().enumerate() {
			let n = i + 1;
			output.lines = n;

			if line.trim().is_empty() {
				flush(&mut pending, ledger, &mut output);
				continue;
			}

			// Indented lines are postings or metadata
			if line.starts_with(char::is_whitespace) {
				if let Some((_, commodity)) = &mut pending {
					self.parse_commodity_metadata(line, commodity)
						.map_err(|e| anyhow!("{} (line {})", e, n))?;
				}
				continue;
			}

			flush(&mut pending, ledger, &mut output);

			// Comments, and org-mode section headers
			if line.starts_with([';', '*', '#']) {
				continue;
			}

			if let Some(caps) = self.directive_regex.captures(line) {
				let date = parse_date(&caps[1])
					.map_err(|e| anyhow!("{} (line {})", e, n))?;
				let keyword = &caps[2];
				let rest = &caps[3];

				match keyword {
					"price" => {
						let record = self
							.parse_price(date, rest)
							.map_err(|e| anyhow!("{} (line {})", e, n))?;
						ledger.add_entry(Entry::new(n, Directive::Price(record)));
						output.prices += 1;
					},
					"commodity" => {
						let currency = match rest.split_whitespace().next() {
							Some(c) if !c.starts_with(';') => c.to_string(),
							_ => bail!("Commodity without a symbol (line {})", n),
						};
						pending = Some((
							n,
							Commodity {
								currency,
								price_source: None,
							},
						));
					},
					k if is_transaction_flag(k)
						|| IGNORED_DIRECTIVES.contains(&k) =>
					{
						ledger.add_entry(Entry::new(n, Directive::Other));
					},
					_ => bail!("Invalid directive (line {}): {}", n, line),
				}
				continue;
			}

			if let Some(caps) = self.option_regex.captures(line) {
				if &caps[1] == "operating_currency" {
					ledger.declare_operating_currency(&caps[2]);
				}
				ledger.add_entry(Entry::new(n, Directive::Other));
				continue;
			}

			let keyword = line.split_whitespace().next().unwrap_or_default();
			if IGNORED_KEYWORDS.contains(&keyword) {
				ledger.add_entry(Entry::new(n, Directive::Other));
				continue;
			}

			bail!("Invalid syntax (line {}): {}", n, line);
		}

		// Make sure to finish the last commodity if the file ends with it
		flush(&mut pending, ledger, &mut output);

		Ok(output)
	}

	/// Parses the part of a price statement after the `price` keyword,
	/// i.e. ` FOO 2.50 USD ; comment`.
	fn parse_price(
		&self,
		date: NaiveDate,
		rest: &str,
	) -> Result<PriceRecord, Error> {
		let caps = match self.price_regex.captures(rest) {
			Some(caps) => caps,
			None => bail!("Invalid price: {}", rest.trim()),
		};

		let rate = Decimal::from_str(&caps[2].replace(',', ""))
			.map_err(|e| anyhow!("Invalid value {}: {}", &caps[2], e))?;

		Ok(PriceRecord::new(
			&caps[1],
			&caps[3],
			date,
			rate,
			Provenance::from_comment(caps.get(4).map(|m| m.as_str())),
		))
	}

	fn parse_commodity_metadata(
		&self,
		line: &str,
		commodity: &mut Commodity,
	) -> Result<(), Error> {
		let caps = match self.metadata_regex.captures(line) {
			Some(caps) => caps,
			None => return Ok(()),
		};

		if &caps[1] != "price" {
			return Ok(());
		}

		let value = caps[2].trim_matches('"');
		if commodity.price_source.is_some() {
			bail!("Multiple price sources for {}", commodity.currency)
		}
		commodity.price_source = Some(PriceSource::from_meta(value)?);

		Ok(())
	}
}

impl Default for Parser {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug, Default)]
pub struct ParseResult {
	/// Number of lines read
	pub lines: usize,
	pub prices: usize,
	pub commodities: usize,
}

fn flush(
	pending: &mut Option<(usize, Commodity)>,
	ledger: &mut Ledger,
	output: &mut ParseResult,
) {
	if let Some((n, commodity)) = pending.take() {
		ledger.add_entry(Entry::new(n, Directive::Commodity(commodity)));
		output.commodities += 1;
	}
}

/// Accepts both `2024-01-05` and `2024/01/05`
fn parse_date(s: &str) -> Result<NaiveDate, Error> {
	NaiveDate::parse_from_str(&s.replace('/', "-"), "%Y-%m-%d")
		.map_err(|_| anyhow!("Invalid date: {}", s))
}

/// Transactions start with a one-character flag like `*` or `!`, or go
/// straight to a quoted payee or narration
fn is_transaction_flag(keyword: &str) -> bool {
	let mut chars = keyword.chars();
	match (chars.next(), chars.next()) {
		(Some('"'), _) => true,
		(Some(c), None) => !c.is_lowercase(),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gl::price::Origin;
	use rust_decimal_macros::dec;

	fn parse(content: &str) -> Result<Ledger, Error> {
		let mut ledger = Ledger::new();
		Parser::new().parse(content, &mut ledger)?;
		Ok(ledger)
	}

	const SAMPLE: &str = r#"option "title" "Sample"
option "operating_currency" "USD"
plugin "beancount.plugins.auto_accounts"

; prices below
2024-01-01 commodity FOO
  name: "Foo Inc"
  price: "USD:yahoo/FOO"
2024-01-01 commodity BAR

2024-01-02 price FOO 2.50 BAR
2024/01/02 price BAR 1,201.5 USD ; from the bank
2024-01-03 price FOO 3.00 USD ; projected via BAR

2024-01-03 * "Coffee" "Morning"
  Expenses:Coffee   4.00 USD
  Assets:Cash
"#;

	#[test]
	fn test_entries_and_lines() {
		let ledger = parse(SAMPLE).unwrap();
		let lines: Vec<(usize, bool)> = ledger
			.entries()
			.iter()
			.map(|e| (e.line, e.is_price()))
			.collect();

		assert_eq!(lines, vec![
			(1, false),
			(2, false),
			(3, false),
			(6, false),
			(9, false),
			(11, true),
			(12, true),
			(13, true),
			(15, false),
		]);
	}

	#[test]
	fn test_operating_currency() {
		let ledger = parse(SAMPLE).unwrap();
		assert_eq!(ledger.operating_currencies(), ["USD"]);
	}

	#[test]
	fn test_commodity_price_source() {
		let ledger = parse(SAMPLE).unwrap();
		let commodities: Vec<&Commodity> = ledger
			.entries()
			.iter()
			.filter_map(|e| match &e.directive {
				Directive::Commodity(c) => Some(c),
				_ => None,
			})
			.collect();

		assert_eq!(commodities.len(), 2);
		let source = commodities[0].price_source.as_ref().unwrap();
		assert_eq!(source.quote, "USD");
		assert_eq!(source.ticker, "FOO");
		assert!(commodities[1].price_source.is_none());
	}

	#[test]
	fn test_price_statements() {
		let prices = parse(SAMPLE).unwrap().price_records();
		assert_eq!(prices.len(), 3);

		assert_eq!(prices[0].base, "FOO");
		assert_eq!(prices[0].quote, "BAR");
		assert_eq!(prices[0].rate.unwrap().to_string(), "2.50");

		assert_eq!(prices[1].rate, Some(dec!(1201.5)));
		assert_eq!(prices[1].provenance.note.as_deref(), Some("from the bank"));

		assert_eq!(prices[2].provenance.origin, Origin::Projected {
			via: vec!["BAR".to_string()]
		});
	}

	#[test]
	fn test_metadata_only_applies_to_commodity() {
		let ledger = parse(
			"2024-01-01 open Assets:Cash\n  price: \"USD:NOPE\"\n",
		)
		.unwrap();
		assert!(ledger.fetch_requests(NaiveDate::MIN).is_empty());
	}

	#[test]
	fn test_commodity_at_end_of_file() {
		let ledger =
			parse("2024-01-01 commodity FOO\n  price: \"USD:FOO\"").unwrap();
		assert_eq!(ledger.commodities().len(), 1);
		assert_eq!(ledger.fetch_requests(NaiveDate::MIN).len(), 1);
	}

	#[test]
	fn test_invalid_price_fails() {
		let err = parse("\n2024-01-01 price FOO\n").unwrap_err();
		assert!(err.to_string().contains("(line 2)"));

		assert!(parse("2024-01-01 price FOO abc USD\n").is_err());
	}

	#[test]
	fn test_invalid_date_fails() {
		assert!(parse("2024-13-01 price FOO 1 USD\n").is_err());
	}

	#[test]
	fn test_transaction_without_flag() {
		let ledger = parse(
			"2024-01-03 \"Cafe\" \"Lunch\"\n  Expenses:Food  5 USD\n  Assets:Cash\n\
			 2024-01-04 \"Groceries\"\n",
		)
		.unwrap();

		let lines: Vec<usize> = ledger.entries().iter().map(|e| e.line).collect();
		assert_eq!(lines, vec![1, 4]);
		assert!(ledger
			.entries()
			.iter()
			.all(|e| matches!(e.directive, Directive::Other)));
	}

	#[test]
	fn test_unknown_directive_fails() {
		assert!(parse("2024-01-01 bogus FOO\n").is_err());
		assert!(parse("hello world\n").is_err());
	}

	#[test]
	fn test_invalid_price_source_fails() {
		let err = parse("2024-01-01 commodity FOO\n  price: \"FOO\"\n")
			.unwrap_err();
		assert!(err.to_string().contains("(line 2)"));
	}
}
