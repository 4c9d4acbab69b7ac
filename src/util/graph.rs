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
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Currency symbol -> symbols one hop away
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Reports every shortest path between two nodes, each as the full list of
/// nodes from `start` to `goal` inclusive, sorted lexicographically. Returns
/// an empty list if no path exists.
///
/// A path never visits the same node twice, and a node is only extended
/// from the depth at which it was first reached, so this terminates on any
/// graph, cyclic or not.
pub fn shortest_paths(
	adjacency: &Adjacency,
	start: &str,
	goal: &str,
) -> Vec<Vec<String>> {
	if start == goal {
		return vec![vec![start.to_string()]];
	}

	let mut reached_at = HashMap::new();
	let mut queue = VecDeque::new();
	let mut shortest_path_length = None;
	let mut paths = vec![];

	reached_at.insert(start.to_string(), 0);
	queue.push_back(vec![start.to_string()]);

	while let Some(path) = queue.pop_front() {
		let depth = path.len() - 1;

		// The queue is ordered by depth, so nothing left can be as short
		if shortest_path_length.is_some_and(|len| depth >= len) {
			break;
		}

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

			let mut next = path.clone();
			next.push(neighbour.clone());

			if neighbour == goal {
				shortest_path_length = Some(depth + 1);
				paths.push(next);
				continue;
			}

			if reached_at.get(neighbour).is_some_and(|&d| d < depth + 1) {
				continue;
			}

			reached_at.insert(neighbour.clone(), depth + 1);
			queue.push_back(next);
		}
	}

	paths.sort();
	paths
}

#[cfg(test)]
mod tests {
	use super::*;

	fn adjacency(edges: &[(&str, &str)]) -> Adjacency {
		let mut out = Adjacency::new();
		for (a, b) in edges {
			out.entry(a.to_string()).or_default().insert(b.to_string());
			out.entry(b.to_string()).or_default().insert(a.to_string());
		}
		out
	}

	#[test]
	fn test_direct_path() {
		let graph = adjacency(&[("USD", "EUR")]);
		assert_eq!(shortest_paths(&graph, "USD", "EUR"), vec![vec![
			"USD", "EUR"
		]]);
	}

	#[test]
	fn test_indirect_path() {
		let graph = adjacency(&[("FOO", "BAR"), ("BAR", "USD")]);
		assert_eq!(shortest_paths(&graph, "FOO", "USD"), vec![vec![
			"FOO", "BAR", "USD"
		]]);
	}

	#[test]
	fn test_prefers_shortest() {
		let graph = adjacency(&[
			("A", "B"),
			("B", "C"),
			("C", "D"),
			("A", "D"),
		]);
		assert_eq!(shortest_paths(&graph, "A", "D"), vec![vec!["A", "D"]]);
	}

	#[test]
	fn test_all_shortest_paths_sorted() {
		let graph = adjacency(&[
			("A", "Y"),
			("Y", "D"),
			("A", "X"),
			("X", "D"),
		]);
		assert_eq!(shortest_paths(&graph, "A", "D"), vec![
			vec!["A", "X", "D"],
			vec!["A", "Y", "D"],
		]);
	}

	#[test]
	fn test_no_path() {
		let graph = adjacency(&[("USD", "EUR"), ("JPY", "INR")]);
		assert!(shortest_paths(&graph, "USD", "JPY").is_empty());
		assert!(shortest_paths(&graph, "USD", "XYZ").is_empty());
	}

	#[test]
	fn test_same_node() {
		let graph = Adjacency::new();
		assert_eq!(shortest_paths(&graph, "USD", "USD"), vec![vec!["USD"]]);
	}

	#[test]
	fn test_cycle_terminates() {
		// A dense cycle with the goal absent must still finish
		let graph = adjacency(&[
			("A", "B"),
			("B", "C"),
			("C", "A"),
			("C", "D"),
			("D", "B"),
		]);
		assert!(shortest_paths(&graph, "A", "Z").is_empty());
		assert_eq!(shortest_paths(&graph, "A", "D"), vec![
			vec!["A", "B", "D"],
			vec!["A", "C", "D"],
		]);
	}

	#[test]
	fn test_large_connected_graph() {
		let currencies: Vec<String> =
			(1..=40).map(|i| format!("C{i:03}")).collect();
		let mut edges = vec![];
		for i in 0..currencies.len() {
			for j in i + 1..currencies.len() {
				edges.push((currencies[i].as_str(), currencies[j].as_str()));
			}
		}
		let graph = adjacency(&edges);

		let paths = shortest_paths(&graph, "C001", "C040");
		assert_eq!(paths, vec![vec!["C001", "C040"]]);
	}
}
