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
use regex::Regex;

/// Lines up the amounts of a ledger so that their decimal points share a
/// column. Only lines with an amount are touched, and line endings are kept.
pub struct Formatter {
	amount_regex: Regex,
}

struct AmountLine<'a> {
	prefix: &'a str,
	int: &'a str,
	frac: &'a str,
	rest: &'a str,
}

impl Formatter {
	pub fn new() -> Self {
		Self {
			// Either a dated directive, or an indented posting. The prefix is
			// lazy, so the amount is the first number followed by a currency.
			amount_regex: Regex::new(
				r"^(\d{4}[-/]\d{1,2}[-/]\d{1,2}\s.*?|\s+[^\s;].*?)\s+(-?[\d,]*\d)(\.\d*)?\s+([A-Z][A-Z0-9'._-]*(?:\s.*)?)$",
			)
			.unwrap(),
		}
	}

	pub fn align(&self, text: &str) -> String {
		let lines: Vec<(&str, &str)> =
			text.split_inclusive('\n').map(split_terminator).collect();
		let parsed: Vec<Option<AmountLine>> =
			lines.iter().map(|(body, _)| self.parse_line(body)).collect();

		let mut prefix_width = 0;
		let mut int_width = 0;
		let mut frac_width = 0;
		for line in parsed.iter().flatten() {
			prefix_width = prefix_width.max(line.prefix.chars().count());
			int_width = int_width.max(line.int.chars().count());
			frac_width = frac_width.max(line.frac.chars().count());
		}

		let mut out = String::with_capacity(text.len());
		for ((body, terminator), line) in lines.iter().zip(parsed) {
			match line {
				Some(l) => out.push_str(&format!(
					"{:<pw$}  {:>iw$}{:<fw$} {}",
					l.prefix,
					l.int,
					l.frac,
					l.rest,
					pw = prefix_width,
					iw = int_width,
					fw = frac_width
				)),
				None => out.push_str(body),
			}
			out.push_str(terminator);
		}

		out
	}

	fn parse_line<'a>(&self, body: &'a str) -> Option<AmountLine<'a>> {
		let caps = self.amount_regex.captures(body)?;
		let prefix = caps.get(1)?.as_str();

		// Transaction headers and quoted metadata are left alone
		if prefix.contains('"') {
			return None;
		}

		Some(AmountLine {
			prefix: prefix.trim_end(),
			int: caps.get(2)?.as_str(),
			frac: caps.get(3).map_or("", |m| m.as_str()),
			rest: caps.get(4)?.as_str(),
		})
	}
}

impl Default for Formatter {
	fn default() -> Self {
		Self::new()
	}
}

fn split_terminator(line: &str) -> (&str, &str) {
	if let Some(body) = line.strip_suffix("\r\n") {
		(body, "\r\n")
	} else if let Some(body) = line.strip_suffix('\n') {
		(body, "\n")
	} else {
		(line, "")
	}
}
