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
use crate::import::http::Client;
use crate::import::quotes::{FetchError, QuoteSource};
use anyhow::Error;
use serde::Deserialize;
use std::time::Duration;

// Models for the v8 chart endpoint; only the fields we read

#[derive(Debug, Deserialize)]
struct ChartResponse {
	chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
	result: Option<Vec<ChartData>>,
	error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
	code: String,
	description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
	meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
	regular_market_price: Option<f64>,
}

/// Looks up the latest regular market price of a Yahoo Finance ticker.
pub struct YahooClient {
	http: Client,
}

impl YahooClient {
	pub fn new(
		api_url: &str,
		timeout: Duration,
		user_agent: &str,
	) -> Result<Self, Error> {
		Ok(Self {
			http: Client::new(api_url, timeout, user_agent)?,
		})
	}
}

impl QuoteSource for YahooClient {
	fn last_price(&self, ticker: &str) -> Result<f64, FetchError> {
		let endpoint = format!("v8/finance/chart/{}", ticker);
		let query = [("range", "1d"), ("interval", "1d")];

		let response: ChartResponse =
			match self.http.get(&endpoint, Some(query)) {
				Ok(r) => r,
				Err(FetchError::Status(404)) => {
					return Err(FetchError::NotFound(ticker.to_string()))
				},
				Err(e) => return Err(e),
			};

		last_price_from(ticker, response)
	}
}

fn last_price_from(
	ticker: &str,
	response: ChartResponse,
) -> Result<f64, FetchError> {
	if let Some(err) = response.chart.error {
		if err.code == "Not Found" {
			return Err(FetchError::NotFound(ticker.to_string()));
		}
		return Err(FetchError::Parse(format!(
			"{}: {}",
			err.code,
			err.description.unwrap_or_default()
		)));
	}

	let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
		Some(data) => data,
		None => return Err(FetchError::NotFound(ticker.to_string())),
	};

	match data.meta.regular_market_price {
		Some(price) => Ok(price),
		None => Err(FetchError::Parse(format!(
			"no regularMarketPrice for {}",
			ticker
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(ticker: &str, body: &str) -> Result<f64, FetchError> {
		let response: ChartResponse = serde_json::from_str(body).unwrap();
		last_price_from(ticker, response)
	}

	#[test]
	fn test_reads_regular_market_price() {
		let body = r#"{"chart":{"result":[{"meta":{"currency":"USD",
			"symbol":"AAPL","regularMarketPrice":189.84,
			"exchangeName":"NMS"},"timestamp":[1704810600],
			"indicators":{"quote":[{}]}}],"error":null}}"#;
		assert_eq!(parse("AAPL", body).unwrap(), 189.84);
	}

	#[test]
	fn test_not_found_error() {
		let body = r#"{"chart":{"result":null,"error":{"code":"Not Found",
			"description":"No data found, symbol may be delisted"}}}"#;
		assert!(matches!(parse("NOPE", body), Err(FetchError::NotFound(_))));
	}

	#[test]
	fn test_missing_price_is_parse_error() {
		let body = r#"{"chart":{"result":[{"meta":{"symbol":"X"}}],
			"error":null}}"#;
		assert!(matches!(parse("X", body), Err(FetchError::Parse(_))));
	}

	#[test]
	fn test_empty_result_is_not_found() {
		let body = r#"{"chart":{"result":[],"error":null}}"#;
		assert!(matches!(parse("X", body), Err(FetchError::NotFound(_))));
	}
}
