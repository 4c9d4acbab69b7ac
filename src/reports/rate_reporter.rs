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
use crate::gl::observed_rate::{ObservationType, ObservedRate};
use crate::reports::table::Table;
use std::collections::BTreeMap;

pub struct RateReporter {
	rates: BTreeMap<(String, String), Vec<ObservedRate>>,
}

impl RateReporter {
	pub fn new(rates: BTreeMap<(String, String), Vec<ObservedRate>>) -> Self {
		Self { rates }
	}

	/// Every rate in the graph, one row per observation. `Ob` marks direct
	/// observations and `Pr` projected ones.
	pub fn render_all_rates(&self) -> String {
		let mut table = Table::new(6);

		table.add_header(vec!["Base", "Quote", "Date", "Rate", "T", "Via"]);
		table.add_separator();
		table.right_align(vec![3]);

		for ((base, quote), rate_set) in &self.rates {
			if base == quote {
				continue;
			}

			for observation in rate_set {
				table.add_row(vec![
					base,
					quote,
					&observation.date.to_string(),
					&observation.rate.to_string(),
					match observation.observation_type {
						ObservationType::Direct => "Ob",
						ObservationType::Projected => "Pr",
					},
					&observation.via.join(", "),
				])
			}
		}

		table.render()
	}
}
