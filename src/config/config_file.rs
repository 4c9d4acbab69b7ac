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
use crate::gl::ledger::Ledger;
use crate::gl::price::DEFAULT_DATE_FORMAT;
use crate::parsing::parser::Parser;
use anyhow::{bail, Error};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt::Write;
use std::time::Duration;

pub const DEFAULT_PRECISION: u32 = 3;
pub const DEFAULT_API_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str =
	concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Largest scale a Decimal can carry
const MAX_PRECISION: u32 = 28;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
	pub prices: Option<Prices>,
	pub quotes: Option<Quotes>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Prices {
	/// chrono strftime format used for written price statements
	pub date_format: Option<String>,

	/// Fractional digits kept on fetched rates
	pub precision: Option<u32>,

	/// Whether to align amount columns after writing
	pub align: Option<bool>,

	/// Reporting currencies in addition to the ledger's own options
	pub operating_currencies: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Quotes {
	pub api_url: Option<String>,
	pub timeout_secs: Option<u64>,
	pub user_agent: Option<String>,
}

impl Config {
	/// Rejects settings that would only fail later, halfway through a
	/// rewrite.
	pub fn validate(&self) -> Result<(), Error> {
		let format = self.date_format();
		if !writes_readable_dates(format) {
			bail!(
				"prices.date_format must write dates as YYYY-MM-DD or \
				 YYYY/MM/DD: {}",
				format
			)
		}

		if self.precision() > MAX_PRECISION {
			bail!("prices.precision may be at most {}", MAX_PRECISION)
		}

		if self.timeout().is_zero() {
			bail!("quotes.timeout_secs must be positive")
		}

		Ok(())
	}

	pub fn date_format(&self) -> &str {
		self.prices
			.as_ref()
			.and_then(|p| p.date_format.as_deref())
			.unwrap_or(DEFAULT_DATE_FORMAT)
	}

	pub fn precision(&self) -> u32 {
		self.prices
			.as_ref()
			.and_then(|p| p.precision)
			.unwrap_or(DEFAULT_PRECISION)
	}

	pub fn align(&self) -> bool {
		self.prices.as_ref().and_then(|p| p.align).unwrap_or(true)
	}

	pub fn operating_currencies(&self) -> &[String] {
		self.prices
			.as_ref()
			.and_then(|p| p.operating_currencies.as_deref())
			.unwrap_or_default()
	}

	pub fn api_url(&self) -> &str {
		self.quotes
			.as_ref()
			.and_then(|q| q.api_url.as_deref())
			.unwrap_or(DEFAULT_API_URL)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(
			self.quotes
				.as_ref()
				.and_then(|q| q.timeout_secs)
				.unwrap_or(DEFAULT_TIMEOUT_SECS),
		)
	}

	pub fn user_agent(&self) -> &str {
		self.quotes
			.as_ref()
			.and_then(|q| q.user_agent.as_deref())
			.unwrap_or(DEFAULT_USER_AGENT)
	}
}

/// Whether price statements dated with `format` read back as the same date.
/// Formats that need a time of day fail to write at all.
fn writes_readable_dates(format: &str) -> bool {
	let sample = match NaiveDate::from_ymd_opt(2024, 1, 5) {
		Some(d) => d,
		None => return false,
	};

	let mut statement = String::new();
	if write!(statement, "{} price FOO 1 USD", sample.format(format)).is_err()
	{
		return false;
	}

	let mut ledger = Ledger::new();
	Parser::new().parse(&statement, &mut ledger).is_ok()
		&& ledger
			.price_records()
			.first()
			.is_some_and(|r| r.date == sample)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config: Config = toml::from_str("").unwrap();
		assert!(config.validate().is_ok());
		assert_eq!(config.date_format(), "%Y-%m-%d");
		assert_eq!(config.precision(), 3);
		assert!(config.align());
		assert!(config.operating_currencies().is_empty());
		assert_eq!(config.api_url(), DEFAULT_API_URL);
		assert_eq!(config.timeout(), Duration::from_secs(10));
	}

	#[test]
	fn test_full_config() {
		let config: Config = toml::from_str(
			r#"
			[prices]
			date_format = "%Y/%m/%d"
			precision = 4
			align = false
			operating_currencies = ["USD", "CAD"]

			[quotes]
			api_url = "http://localhost:8080"
			timeout_secs = 3
			user_agent = "test"
			"#,
		)
		.unwrap();

		assert!(config.validate().is_ok());
		assert_eq!(config.date_format(), "%Y/%m/%d");
		assert_eq!(config.precision(), 4);
		assert!(!config.align());
		assert_eq!(config.operating_currencies(), ["USD", "CAD"]);
		assert_eq!(config.api_url(), "http://localhost:8080");
		assert_eq!(config.timeout(), Duration::from_secs(3));
		assert_eq!(config.user_agent(), "test");
	}

	#[test]
	fn test_invalid_date_format() {
		let config: Config =
			toml::from_str("[prices]\ndate_format = \"%Y-%Q\"").unwrap();
		assert!(config.validate().is_err());

		let config: Config =
			toml::from_str("[prices]\ndate_format = \"\"").unwrap();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_date_format_with_time_fails() {
		let config: Config =
			toml::from_str("[prices]\ndate_format = \"%Y-%m-%d %H:%M\"")
				.unwrap();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_date_format_the_parser_cannot_read_fails() {
		let formats = ["%d.%m.%Y", "%Y-%d-%m", "%y-%m-%d", "%Y%m%d", "%Y-%m-%e"];
		for format in formats {
			let config: Config = toml::from_str(&format!(
				"[prices]\ndate_format = \"{}\"",
				format
			))
			.unwrap();
			assert!(config.validate().is_err(), "{} was accepted", format);
		}

		let config: Config =
			toml::from_str("[prices]\ndate_format = \"%Y/%-m/%-d\"").unwrap();
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_invalid_precision() {
		let config: Config =
			toml::from_str("[prices]\nprecision = 40").unwrap();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_wrong_type_fails_to_parse() {
		assert!(toml::from_str::<Config>("[prices]\nalign = \"yes\"").is_err());
	}
}
