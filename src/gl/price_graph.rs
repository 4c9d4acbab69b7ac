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

use crate::gl::observed_rate::ObservedRate;
use crate::gl::price::PriceRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Every rate the ledger knows about, as one date-ordered series per
/// (base, quote) pair. Only the orientation that was actually observed is
/// stored; the inverse is computed on demand by [`PriceGraph::leg`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceGraph {
	series: BTreeMap<(String, String), Vec<ObservedRate>>,
}

impl PriceGraph {
	pub fn new() -> Self {
		Default::default()
	}

	/// Builds the graph of direct observations. Unresolved records and
	/// records derived by an earlier projection are not ground truth, so
	/// they are left out.
	pub fn from_records<'a, I>(records: I) -> Self
	where
		I: IntoIterator<Item = &'a PriceRecord>,
	{
		let mut graph = Self::new();

		for record in records {
			if record.provenance.is_projected() {
				continue;
			}
			let rate = match record.rate {
				Some(rate) => rate,
				None => continue,
			};

			graph.add_observation(
				&record.base,
				&record.quote,
				ObservedRate::direct(record.date, rate),
			);
		}

		graph
	}

	/// Adds an observation, keeping the series sorted by date. On a second
	/// observation of the same pair and date, the newer one wins.
	pub fn add_observation(
		&mut self,
		base: &str,
		quote: &str,
		mut observation: ObservedRate,
	) {
		if base == quote {
			if observation.rate != Decimal::ONE {
				warn!(
					"[{}]: price of {} in itself is always 1, ignoring {}",
					observation.date, base, observation.rate
				);
			}
			observation.rate = Decimal::ONE;
		} else if observation.rate <= Decimal::ZERO {
			warn!(
				"[{}]: ignoring non-positive price of {} in {}",
				observation.date, base, quote
			);
			return;
		}

		let series = self
			.series
			.entry((base.to_string(), quote.to_string()))
			.or_default();

		match series.binary_search_by(|o| o.date.cmp(&observation.date)) {
			Ok(i) => {
				warn!(
					"[{}]: multiple prices of {} in {}; using the last one",
					observation.date, base, quote
				);
				series[i] = observation;
			},
			Err(i) => series.insert(i, observation),
		}
	}

	/// Sets the whole series of a pair at once. Existing series are never
	/// replaced, which is what keeps observed data ahead of anything
	/// derived from it.
	pub fn insert_series_if_absent(
		&mut self,
		base: &str,
		quote: &str,
		mut series: Vec<ObservedRate>,
	) -> bool {
		let key = (base.to_string(), quote.to_string());
		if series.is_empty() || self.series.contains_key(&key) {
			return false;
		}

		series.sort_by_key(|o| o.date);
		self.series.insert(key, series);
		true
	}

	pub fn contains_pair(&self, base: &str, quote: &str) -> bool {
		self.series
			.contains_key(&(base.to_string(), quote.to_string()))
	}

	pub fn series(&self, base: &str, quote: &str) -> Option<&[ObservedRate]> {
		self.series
			.get(&(base.to_string(), quote.to_string()))
			.map(Vec::as_slice)
	}

	pub fn iter(
		&self,
	) -> impl Iterator<Item = (&(String, String), &Vec<ObservedRate>)> {
		self.series.iter()
	}

	#[cfg(test)]
	pub fn pairs(&self) -> BTreeSet<(String, String)> {
		self.series.keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.series.len()
	}

	pub fn is_empty(&self) -> bool {
		self.series.is_empty()
	}

	/// Every symbol that appears on either side of a pair.
	pub fn commodities(&self) -> BTreeSet<String> {
		self.series
			.keys()
			.flat_map(|(b, q)| [b.clone(), q.clone()])
			.collect()
	}

	/// Symbol -> symbols reachable in one hop. A rate A->B is usable in
	/// both directions, so every pair contributes two edges. Self-pairs
	/// contribute none.
	pub fn adjacency(&self) -> BTreeMap<String, BTreeSet<String>> {
		let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
		for (base, quote) in self.series.keys() {
			if base == quote {
				continue;
			}
			out.entry(base.clone()).or_default().insert(quote.clone());
			out.entry(quote.clone()).or_default().insert(base.clone());
		}
		out
	}

	/// The dated rates to go from `from` to `to` in one hop. Prefers the
	/// pair as observed, and otherwise inverts the opposite pair.
	pub fn leg(&self, from: &str, to: &str) -> Option<Vec<(NaiveDate, Decimal)>> {
		if let Some(series) = self.series(from, to) {
			return Some(series.iter().map(|o| (o.date, o.rate)).collect());
		}

		self.series(to, from).map(|series| {
			series
				.iter()
				.filter_map(|o| {
					Decimal::ONE.checked_div(o.rate).map(|r| (o.date, r))
				})
				.collect()
		})
	}

	/// Retrieves the most recent one-hop rate, if any, at or before the
	/// given date.
	pub fn rate_as_of(
		&self,
		from: &str,
		to: &str,
		as_of: &NaiveDate,
	) -> Option<Decimal> {
		if let Some(series) = self.series(from, to) {
			return series
				.iter()
				.rev()
				.find(|o| o.date <= *as_of)
				.map(|o| o.rate);
		}

		self.series(to, from).and_then(|series| {
			series
				.iter()
				.rev()
				.find(|o| o.date <= *as_of)
				.and_then(|o| Decimal::ONE.checked_div(o.rate))
		})
	}

	/// Returns the underlying map of series. Consumes this.
	pub fn take_all_rates(
		self,
	) -> BTreeMap<(String, String), Vec<ObservedRate>> {
		self.series
	}
}
