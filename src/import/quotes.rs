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
use crate::gl::price::{round_fixed, PriceRecord};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("network error: {0}")]
	Network(String),

	#[error("request failed with status {0}")]
	Status(u16),

	#[error("unexpected response: {0}")]
	Parse(String),

	#[error("ticker not found: {0}")]
	NotFound(String),

	#[error("unusable price {value} for {ticker}")]
	Unusable { ticker: String, value: f64 },
}

/// Anything that can tell the latest price of a ticker.
pub trait QuoteSource: Sync {
	fn last_price(&self, ticker: &str) -> Result<f64, FetchError>;
}

/// Resolves the rate of every request that names a ticker. Each ticker is
/// looked up once, all of them at the same time. Failures are logged and
/// leave the request unresolved.
pub fn fetch_all<S>(
	source: &S,
	mut requests: Vec<PriceRecord>,
	precision: u32,
) -> Vec<PriceRecord>
where
	S: QuoteSource + ?Sized,
{
	let tickers: BTreeSet<&str> =
		requests.iter().filter_map(|r| r.source.as_deref()).collect();

	let results: BTreeMap<String, Result<Decimal, FetchError>> =
		thread::scope(|s| {
			let handles: Vec<_> = tickers
				.iter()
				.map(|&t| (t, s.spawn(move || resolve(source, t, precision))))
				.collect();

			handles
				.into_iter()
				.map(|(t, handle)| {
					let result = handle.join().unwrap_or_else(|_| {
						Err(FetchError::Network("lookup panicked".to_string()))
					});
					(t.to_string(), result)
				})
				.collect()
		});

	let mut resolved = 0;
	for request in &mut requests {
		let ticker = match &request.source {
			Some(t) => t,
			None => continue,
		};

		match results.get(ticker) {
			Some(Ok(rate)) => {
				request.rate = Some(*rate);
				resolved += 1;
			},
			Some(Err(e)) => warn!(
				"{}: unable to fetch price of {}: {}",
				request.base, ticker, e
			),
			None => {},
		}
	}

	info!("fetched {} of {} prices", resolved, requests.len());
	requests
}

fn resolve<S>(
	source: &S,
	ticker: &str,
	precision: u32,
) -> Result<Decimal, FetchError>
where
	S: QuoteSource + ?Sized,
{
	let value = source.last_price(ticker)?;
	let unusable = || FetchError::Unusable {
		ticker: ticker.to_string(),
		value,
	};

	if !value.is_finite() || value <= 0.0 {
		return Err(unusable());
	}

	let rate = Decimal::from_f64(value).ok_or_else(unusable)?;
	let rate = round_fixed(rate, precision);
	if rate.is_zero() {
		return Err(unusable());
	}

	Ok(rate)
}
