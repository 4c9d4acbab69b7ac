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
use crate::gl::price::{round_fixed, Origin, PriceRecord, Provenance};
use crate::gl::price_graph::PriceGraph;
use tracing::warn;

/// Fractional digits of every derived price statement
pub const PROJECTED_PRECISION: u32 = 2;

/// Picks out the projected rates worth writing to the ledger: those quoted
/// in an operating currency, for a pair the ledger did not already observe
/// in either direction. Rates are rounded to [`PROJECTED_PRECISION`] here,
/// and only here.
pub fn new_entries(
	projected: &PriceGraph,
	observed: &PriceGraph,
	operating_currencies: &[String],
) -> Vec<PriceRecord> {
	let mut out = vec![];

	for ((base, quote), series) in projected.iter() {
		if base == quote
			|| observed.contains_pair(base, quote)
			|| observed.contains_pair(quote, base)
			|| !operating_currencies.contains(quote)
		{
			continue;
		}

		for observation in series {
			let rate = round_fixed(observation.rate, PROJECTED_PRECISION);
			if rate.is_zero() {
				warn!(
					"[{}]: price of {} in {} rounds to zero; not writing it",
					observation.date, base, quote
				);
				continue;
			}

			out.push(PriceRecord::new(
				base,
				quote,
				observation.date,
				rate,
				Provenance::new(Origin::Projected {
					via: observation.via.clone(),
				}),
			));
		}
	}

	out
}
