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
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Marker written after derived price statements so that a later run can
/// tell them apart from prices the user observed.
pub const PROJECTED_MARKER: &str = "projected";

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// The identity of a price: two records with the same key describe the same
/// fact, even if they disagree on the rate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceKey {
	pub base: String,
	pub quote: String,
	pub date: NaiveDate,
}

/// One unit of `base` is worth `rate` units of `quote` on `date`.
///
/// Has no equality of its own; compare records through
/// [`PriceRecord::key`] so that the rate never takes part in identity.
#[derive(Clone, Debug)]
pub struct PriceRecord {
	pub base: String,
	pub quote: String,
	pub date: NaiveDate,

	/// None until a fetch resolves it. Unresolved records are never written.
	pub rate: Option<Decimal>,

	/// Ticker used to look the rate up, if it has to be fetched
	pub source: Option<String>,

	pub provenance: Provenance,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Provenance {
	pub origin: Origin,

	/// Free-form trailing comment carried along with the statement
	pub note: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Origin {
	/// Written in the ledger by the user
	#[default]
	Ledger,
	/// Looked up from a market data provider during this run
	Fetched,
	/// Composed from other rates; `via` holds the intermediate currencies
	Projected { via: Vec<String> },
}

impl Provenance {
	pub fn new(origin: Origin) -> Self {
		Self { origin, note: None }
	}

	/// Reconstructs provenance from the trailing comment of a statement.
	pub fn from_comment(comment: Option<&str>) -> Self {
		let comment = match comment.map(str::trim) {
			None | Some("") => return Self::default(),
			Some(c) => c,
		};

		if let Some(rest) = comment.strip_prefix(PROJECTED_MARKER) {
			let rest = rest.trim();
			if rest.is_empty() {
				return Self::new(Origin::Projected { via: vec![] });
			}
			if let Some(via) = rest.strip_prefix("via ") {
				return Self::new(Origin::Projected {
					via: via
						.split(',')
						.map(|s| s.trim().to_string())
						.filter(|s| !s.is_empty())
						.collect(),
				});
			}
		}

		Self {
			origin: Origin::Ledger,
			note: Some(comment.to_string()),
		}
	}

	/// The comment to write after the statement, if any.
	pub fn comment(&self) -> Option<String> {
		match &self.origin {
			Origin::Projected { via } if via.is_empty() => {
				Some(PROJECTED_MARKER.to_string())
			},
			Origin::Projected { via } => {
				Some(format!("{} via {}", PROJECTED_MARKER, via.join(", ")))
			},
			_ => self.note.clone(),
		}
	}

	pub fn is_projected(&self) -> bool {
		matches!(self.origin, Origin::Projected { .. })
	}
}

impl PriceRecord {
	pub fn new(
		base: &str,
		quote: &str,
		date: NaiveDate,
		rate: Decimal,
		provenance: Provenance,
	) -> Self {
		Self {
			base: base.to_string(),
			quote: quote.to_string(),
			date,
			rate: Some(rate),
			source: None,
			provenance,
		}
	}

	/// A record that still needs its rate looked up under `ticker`.
	pub fn unresolved(
		base: &str,
		quote: &str,
		date: NaiveDate,
		ticker: &str,
	) -> Self {
		Self {
			base: base.to_string(),
			quote: quote.to_string(),
			date,
			rate: None,
			source: Some(ticker.to_string()),
			provenance: Provenance::new(Origin::Fetched),
		}
	}

	pub fn key(&self) -> PriceKey {
		PriceKey {
			base: self.base.clone(),
			quote: self.quote.clone(),
			date: self.date,
		}
	}

	pub fn is_resolved(&self) -> bool {
		self.rate.is_some()
	}

	/// Renders this as a single price statement, without a line ending.
	/// Returns None for an unresolved record.
	pub fn to_statement(&self, date_format: &str) -> Option<String> {
		let rate = self.rate?;
		let mut out = format!(
			"{} price {} {} {}",
			self.date.format(date_format),
			self.base,
			rate,
			self.quote
		);

		if let Some(comment) = self.provenance.comment() {
			out.push_str(" ; ");
			out.push_str(&comment);
		}

		Some(out)
	}
}

/// Rounds half away from zero and pads to exactly `places` fractional
/// digits, so that 3 becomes 3.00 at two places.
pub fn round_fixed(value: Decimal, places: u32) -> Decimal {
	let mut out = value
		.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
	out.rescale(places);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;
	use std::collections::HashSet;

	fn date(s: &str) -> NaiveDate {
		NaiveDate::parse_from_str(s, DEFAULT_DATE_FORMAT).unwrap()
	}

	#[test]
	fn test_identity_ignores_rate_and_source() {
		let a = PriceRecord::new(
			"USD",
			"EUR",
			date("2024-01-01"),
			dec!(0.90),
			Provenance::default(),
		);
		let mut b = PriceRecord::unresolved(
			"USD",
			"EUR",
			date("2024-01-01"),
			"EUR=X",
		);
		b.rate = Some(dec!(0.95));

		assert_eq!(a.key(), b.key());

		let keys: HashSet<PriceKey> = [a.key(), b.key()].into_iter().collect();
		assert_eq!(keys.len(), 1);
	}

	#[test]
	fn test_identity_distinguishes_dates() {
		let a = PriceRecord::unresolved("FOO", "USD", date("2024-01-01"), "F");
		let b = PriceRecord::unresolved("FOO", "USD", date("2024-01-02"), "F");
		assert_ne!(a.key(), b.key());
	}

	#[test]
	fn test_statement_keeps_written_scale() {
		let r = PriceRecord::new(
			"BAR",
			"USD",
			date("2024-01-02"),
			dec!(1.20),
			Provenance::default(),
		);
		assert_eq!(
			r.to_statement(DEFAULT_DATE_FORMAT).unwrap(),
			"2024-01-02 price BAR 1.20 USD"
		);
	}

	#[test]
	fn test_statement_with_custom_date_format() {
		let r = PriceRecord::new(
			"BAR",
			"USD",
			date("2024-01-02"),
			dec!(1.2),
			Provenance::default(),
		);
		assert_eq!(
			r.to_statement("%Y/%m/%d").unwrap(),
			"2024/01/02 price BAR 1.2 USD"
		);
	}

	#[test]
	fn test_unresolved_has_no_statement() {
		let r = PriceRecord::unresolved("FOO", "USD", date("2024-01-01"), "F");
		assert!(r.to_statement(DEFAULT_DATE_FORMAT).is_none());
	}

	#[test]
	fn test_projected_comment_round_trip() {
		let p = Provenance::new(Origin::Projected {
			via: vec!["BAR".to_string(), "EUR".to_string()],
		});
		let comment = p.comment().unwrap();
		assert_eq!(comment, "projected via BAR, EUR");
		assert_eq!(Provenance::from_comment(Some(&comment)), p);

		let bare = Provenance::new(Origin::Projected { via: vec![] });
		assert_eq!(Provenance::from_comment(bare.comment().as_deref()), bare);
	}

	#[test]
	fn test_plain_comment_is_kept_as_note() {
		let p = Provenance::from_comment(Some(" from the bank "));
		assert_eq!(p.origin, Origin::Ledger);
		assert_eq!(p.comment().as_deref(), Some("from the bank"));
		assert!(!p.is_projected());
	}

	#[test]
	fn test_round_fixed() {
		assert_eq!(round_fixed(dec!(3), 2).to_string(), "3.00");
		assert_eq!(round_fixed(dec!(2.345), 2).to_string(), "2.35");
		assert_eq!(round_fixed(dec!(1.5), 3).to_string(), "1.500");
		assert_eq!(round_fixed(dec!(0.8333333), 2).to_string(), "0.83");
	}
}
