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
use crate::import::quotes::FetchError;
use anyhow::{anyhow, Error};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Thin blocking JSON client. Shareable across threads.
pub struct Client {
	client: reqwest::blocking::Client,
	base_url: String,
}

impl Client {
	pub fn new(
		base_url: &str,
		timeout: Duration,
		user_agent: &str,
	) -> Result<Self, Error> {
		let client = reqwest::blocking::Client::builder()
			.timeout(timeout)
			.user_agent(user_agent)
			.build()
			.map_err(|e| anyhow!("unable to build HTTP client: {}", e))?;

		Ok(Client {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	pub fn url(&self, endpoint: &str) -> String {
		format!("{}/{}", self.base_url, endpoint)
	}

	/// Sends a GET and decodes the JSON body. Errors on non-2xx response codes.
	pub fn get<Q, R>(
		&self,
		endpoint: &str,
		query_params: Option<Q>,
	) -> Result<R, FetchError>
	where
		Q: Serialize,
		R: for<'de> Deserialize<'de>,
	{
		let url = self.url(endpoint);

		let mut request = self.client.request(Method::GET, &url);

		if let Some(query_params) = query_params {
			request = request.query(&query_params);
		}

		debug!("Sending GET to {}", url);
		let response = request
			.send()
			.map_err(|e| FetchError::Network(e.to_string()))?;

		// Handle non-2xx response codes
		if !response.status().is_success() {
			return Err(FetchError::Status(response.status().as_u16()));
		}

		response
			.json::<R>()
			.map_err(|e| FetchError::Parse(e.to_string()))
	}
}
