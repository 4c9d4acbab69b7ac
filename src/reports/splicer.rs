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
use crate::gl::entry::Entry;
use crate::gl::price::{PriceKey, PriceRecord};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// The 1-based lines of the original text that held price statements.
/// Captured once, before anything is rewritten.
#[derive(Debug, Default)]
pub struct PriceLineIndex {
	lines: BTreeSet<usize>,
}

impl PriceLineIndex {
	pub fn capture(entries: &[Entry]) -> Self {
		entries
			.iter()
			.filter(|e| e.is_price())
			.map(|e| e.line)
			.collect()
	}

	pub fn contains(&self, line: usize) -> bool {
		self.lines.contains(&line)
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}
}

impl FromIterator<usize> for PriceLineIndex {
	fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
		Self {
			lines: iter.into_iter().collect(),
		}
	}
}

/// Combines the prices already in the ledger with fresh ones into the block
/// to write. A fresh record replaces any existing one with the same key, and
/// among records sharing a key within one side, the last one wins.
/// Unresolved records never make it into the block.
///
/// The result is sorted by date, then base; ties keep their input order,
/// existing records first.
pub fn merge(
	existing: Vec<PriceRecord>,
	fresh: Vec<PriceRecord>,
) -> Vec<PriceRecord> {
	let existing = last_per_key(resolved_only(existing));
	let fresh = last_per_key(resolved_only(fresh));

	let fresh_keys: HashSet<PriceKey> = fresh.iter().map(|r| r.key()).collect();

	let mut out: Vec<PriceRecord> = existing
		.into_iter()
		.filter(|r| {
			let superseded = fresh_keys.contains(&r.key());
			if superseded {
				debug!(
					"[{}]: replacing price of {} in {}",
					r.date, r.base, r.quote
				);
			}
			!superseded
		})
		.chain(fresh)
		.collect();

	// sort_by is stable
	out.sort_by(|a, b| (a.date, &a.base).cmp(&(b.date, &b.base)));
	out
}

fn resolved_only(records: Vec<PriceRecord>) -> Vec<PriceRecord> {
	records
		.into_iter()
		.filter(|r| {
			if !r.is_resolved() {
				warn!(
					"[{}]: no price for {} ({}); leaving it out",
					r.date,
					r.base,
					r.source.as_deref().unwrap_or("no ticker")
				);
			}
			r.is_resolved()
		})
		.collect()
}

fn last_per_key(records: Vec<PriceRecord>) -> Vec<PriceRecord> {
	let mut last: HashMap<PriceKey, usize> = HashMap::new();
	for (i, r) in records.iter().enumerate() {
		last.insert(r.key(), i);
	}

	records
		.into_iter()
		.enumerate()
		.filter(|(i, r)| last.get(&r.key()) == Some(i))
		.map(|(_, r)| r)
		.collect()
}

/// Writes a block of price statements back into ledger text.
pub struct Splicer {
	date_format: String,
}

impl Splicer {
	pub fn new(date_format: &str) -> Self {
		Self {
			date_format: date_format.to_string(),
		}
	}

	/// Replaces the price lines of `text` with `records`. The whole block
	/// goes where the first price line was; later price lines are dropped
	/// and every other line is copied verbatim. Without any price lines the
	/// text comes back unchanged, since there is nowhere to put the block.
	pub fn splice(
		&self,
		text: &str,
		index: &PriceLineIndex,
		records: &[PriceRecord],
	) -> String {
		if index.is_empty() {
			return text.to_string();
		}

		let mut out = String::with_capacity(text.len());
		let mut emitted = false;

		for (i, line) in text.split_inclusive('\n').enumerate() {
			if !index.contains(i + 1) {
				out.push_str(line);
				continue;
			}
			if emitted {
				continue;
			}

			// The block is terminated like the line it replaces
			let terminator = if line.ends_with("\r\n") { "\r\n" } else { "\n" };
			for statement in
				records.iter().filter_map(|r| r.to_statement(&self.date_format))
			{
				out.push_str(&statement);
				out.push_str(terminator);
			}
			emitted = true;
		}

		out
	}
}
