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
use crate::gl::price::PriceRecord;
use anyhow::{bail, Error};

pub const DEFAULT_PROVIDER: &str = "yahoo";

/// A parsed ledger directive, together with the line it started on.
#[derive(Clone, Debug)]
pub struct Entry {
	/// 1-based line number in the original text
	pub line: usize,
	pub directive: Directive,
}

#[derive(Clone, Debug)]
pub enum Directive {
	Commodity(Commodity),
	Price(PriceRecord),
	/// Anything this tool does not need to understand
	Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commodity {
	pub currency: String,
	pub price_source: Option<PriceSource>,
}

/// Where to look up the price of a commodity, from its `price` metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceSource {
	pub quote: String,
	pub provider: String,
	pub ticker: String,
}

impl Entry {
	pub fn new(line: usize, directive: Directive) -> Self {
		Self { line, directive }
	}

	pub fn is_price(&self) -> bool {
		matches!(self.directive, Directive::Price(_))
	}
}

impl PriceSource {
	/// Parses the value of a commodity's `price` metadata. Accepts
	/// `USD:AAPL`, `USD:yahoo/AAPL` and `yahoo/USD:AAPL`. When several
	/// sources are listed, only the first is used.
	pub fn from_meta(value: &str) -> Result<Self, Error> {
		let spec = match value.split_whitespace().next() {
			Some(spec) => spec,
			None => bail!("Empty price source"),
		};

		let (quote_part, source_part) = match spec.split_once(':') {
			Some(parts) => parts,
			None => bail!("Price source must look like CCY:ticker: {}", value),
		};

		let mut provider = None;

		let quote = match quote_part.split_once('/') {
			Some((p, q)) => {
				provider = Some(p);
				q
			},
			None => quote_part,
		};

		let source = source_part.split(',').next().unwrap_or_default();
		let ticker = match source.split_once('/') {
			Some((p, t)) => {
				provider = Some(p);
				t
			},
			None => source,
		};

		if quote.is_empty() || ticker.is_empty() {
			bail!("Price source must look like CCY:ticker: {}", value)
		}

		Ok(Self {
			quote: quote.to_string(),
			provider: provider.unwrap_or(DEFAULT_PROVIDER).to_string(),
			ticker: ticker.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn source(quote: &str, provider: &str, ticker: &str) -> PriceSource {
		PriceSource {
			quote: quote.to_string(),
			provider: provider.to_string(),
			ticker: ticker.to_string(),
		}
	}

	#[test]
	fn test_price_source_forms() {
		assert_eq!(
			PriceSource::from_meta("USD:AAPL").unwrap(),
			source("USD", "yahoo", "AAPL")
		);
		assert_eq!(
			PriceSource::from_meta("USD:yahoo/AAPL").unwrap(),
			source("USD", "yahoo", "AAPL")
		);
		assert_eq!(
			PriceSource::from_meta("yahoo/CAD:SHOP.TO").unwrap(),
			source("CAD", "yahoo", "SHOP.TO")
		);
		assert_eq!(
			PriceSource::from_meta("USD:coinbase/BTC-USD,yahoo/BTC-USD")
				.unwrap(),
			source("USD", "coinbase", "BTC-USD")
		);
		assert_eq!(
			PriceSource::from_meta("USD:yahoo/VTI CAD:yahoo/VTI.TO").unwrap(),
			source("USD", "yahoo", "VTI")
		);
	}

	#[test]
	fn test_price_source_invalid() {
		assert!(PriceSource::from_meta("").is_err());
		assert!(PriceSource::from_meta("AAPL").is_err());
		assert!(PriceSource::from_meta("USD:").is_err());
		assert!(PriceSource::from_meta(":AAPL").is_err());
	}
}
