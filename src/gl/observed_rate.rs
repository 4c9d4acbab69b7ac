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
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// An exchange rate between two currencies, observed on a specific date.
/// A value object not intended to have much functionality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedRate {
	pub date: NaiveDate,
	pub rate: Decimal,
	pub observation_type: ObservationType,

	/// Currencies passed through to arrive at a projected rate, in order.
	/// Empty for direct observations.
	pub via: Vec<String>,
}

impl ObservedRate {
	pub fn direct(date: NaiveDate, rate: Decimal) -> Self {
		Self {
			date,
			rate,
			observation_type: ObservationType::Direct,
			via: vec![],
		}
	}

	pub fn projected(date: NaiveDate, rate: Decimal, via: Vec<String>) -> Self {
		Self {
			date,
			rate,
			observation_type: ObservationType::Projected,
			via,
		}
	}
}

/// The nature of an observation of an exchange rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationType {
	/// The ledger states this rate, or a provider reported it, so it is
	/// gospel
	Direct,
	/// The graph says that this rate is sensible from traversal
	Projected,
}
