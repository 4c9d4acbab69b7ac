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
use crate::gl::price_graph::PriceGraph;
use crate::util::graph::{shortest_paths, Adjacency};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Extends a graph of observed prices so that every commodity has a price in
/// every operating currency it can reach, by composing the rates along the
/// shortest paths between them that have rates on the same dates.
pub struct Projector {
	operating_currencies: Vec<String>,
}

impl Projector {
	pub fn new(operating_currencies: &[String]) -> Self {
		let mut currencies: Vec<String> = vec![];
		for c in operating_currencies {
			if !currencies.contains(c) {
				currencies.push(c.clone());
			}
		}

		Self {
			operating_currencies: currencies,
		}
	}

	/// Returns a superset of `observed`: every pair in it is carried over
	/// untouched, and one projected series is added per (commodity,
	/// operating currency) pair that was missing and could be composed.
	///
	/// Commodities considered are the given ones plus every symbol that
	/// already appears in the graph.
	pub fn project(
		&self,
		observed: &PriceGraph,
		commodities: &BTreeSet<String>,
	) -> PriceGraph {
		if observed.is_empty() {
			debug!("no prices to project from");
			return observed.clone();
		}

		let adjacency = observed.adjacency();
		let mut known = commodities.clone();
		known.extend(observed.commodities());

		let mut projected = observed.clone();
		let mut added = 0;

		for target in &self.operating_currencies {
			for commodity in &known {
				if commodity == target || observed.contains_pair(commodity, target)
				{
					continue;
				}

				let series = compose(observed, &adjacency, commodity, target);
				if series.is_empty() {
					debug!("no price path from {} to {}", commodity, target);
					continue;
				}

				if projected.insert_series_if_absent(commodity, target, series) {
					added += 1;
				}
			}
		}

		info!(
			"projected {} missing price pairs, {} in total",
			added,
			projected.len()
		);
		projected
	}
}

/// Composes the rate series from `from` to `to` along every shortest path.
///
/// The first hop's observation dates anchor the result; every later hop
/// contributes its latest rate on or before each anchor date. When paths
/// compete for a date, the first path in lexicographic order wins. Dates
/// that no shortest path can compose, or every date when none of them can,
/// are looked for along longer paths.
fn compose(
	graph: &PriceGraph,
	adjacency: &Adjacency,
	from: &str,
	to: &str,
) -> Vec<ObservedRate> {
	let paths = shortest_paths(adjacency, from, to);
	if paths.is_empty() {
		return vec![];
	}

	let mut by_date: BTreeMap<NaiveDate, ObservedRate> = BTreeMap::new();
	let mut missed = BTreeSet::new();

	for path in paths.iter().filter(|p| p.len() >= 2) {
		let anchors = match graph.leg(&path[0], &path[1]) {
			Some(leg) => leg,
			None => continue,
		};
		let via = path[1..path.len() - 1].to_vec();

		for (date, rate) in anchors {
			if by_date.contains_key(&date) {
				continue;
			}

			let composed = path.windows(2).skip(1).try_fold(rate, |acc, hop| {
				graph
					.rate_as_of(&hop[0], &hop[1], &date)
					.and_then(|r| acc.checked_mul(r))
			});

			match composed {
				Some(rate) => {
					by_date.insert(
						date,
						ObservedRate::projected(date, rate, via.clone()),
					);
				},
				None => {
					missed.insert(date);
				},
			}
		}
	}

	missed.retain(|d| !by_date.contains_key(d));
	if by_date.is_empty() {
		fill_from_longer_paths(graph, adjacency, from, to, None, &mut by_date);
	} else if !missed.is_empty() {
		debug!(
			"{} dates of {} in {} need a longer path",
			missed.len(),
			from,
			to
		);
		fill_from_longer_paths(
			graph,
			adjacency,
			from,
			to,
			Some(&missed),
			&mut by_date,
		);
	}

	by_date.into_values().collect()
}

/// Walks outward from `from` one hop at a time, carrying the rates composed
/// so far for each anchor date, and fills every date still missing from
/// `by_date` the first time a path reaches `to` with it. Only the `wanted`
/// anchor dates are carried, or all of them if None.
///
/// A currency carries a given date onward only from the first path that
/// reaches it with that date. Later hops only depend on the currency and the
/// date, so this loses nothing and keeps the walk finite on any graph.
fn fill_from_longer_paths(
	graph: &PriceGraph,
	adjacency: &Adjacency,
	from: &str,
	to: &str,
	wanted: Option<&BTreeSet<NaiveDate>>,
	by_date: &mut BTreeMap<NaiveDate, ObservedRate>,
) {
	let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
	let mut frontier: Vec<(Vec<String>, Vec<(NaiveDate, Decimal)>)> =
		vec![(vec![from.to_string()], vec![])];

	while !frontier.is_empty() {
		let mut next = vec![];

		for (path, carried) in frontier {
			let current = match path.last() {
				Some(current) => current,
				None => continue,
			};

			let neighbours = match adjacency.get(current) {
				Some(neighbours) => neighbours,
				None => continue,
			};

			for neighbour in neighbours {
				if path.contains(neighbour) {
					continue;
				}

				let rates: Vec<(NaiveDate, Decimal)> = if path.len() == 1 {
					graph
						.leg(current, neighbour)
						.unwrap_or_default()
						.into_iter()
						.filter(|(d, _)| wanted.map_or(true, |w| w.contains(d)))
						.collect()
				} else {
					carried
						.iter()
						.filter_map(|(d, acc)| {
							graph
								.rate_as_of(current, neighbour, d)
								.and_then(|r| acc.checked_mul(r))
								.map(|r| (*d, r))
						})
						.collect()
				};
				let rates: Vec<(NaiveDate, Decimal)> = rates
					.into_iter()
					.filter(|(d, _)| !by_date.contains_key(d))
					.collect();
				if rates.is_empty() {
					continue;
				}

				let mut extended = path.clone();
				extended.push(neighbour.clone());

				if neighbour == to {
					let via = extended[1..extended.len() - 1].to_vec();
					for (date, rate) in rates {
						by_date.insert(
							date,
							ObservedRate::projected(date, rate, via.clone()),
						);
					}
					continue;
				}

				let rates: Vec<(NaiveDate, Decimal)> = rates
					.into_iter()
					.filter(|(d, _)| seen.insert((neighbour.clone(), *d)))
					.collect();
				if !rates.is_empty() {
					next.push((extended, rates));
				}
			}
		}

		frontier = next;
	}
}
