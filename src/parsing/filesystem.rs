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
use crate::config::config_file::Config;
use anyhow::{anyhow, bail, Error};
use dirs::home_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_PATH: &str = ".config/pricer/config.toml";

pub struct Filesystem {
	/// Where to look for the config when no path is given
	default_config: Option<PathBuf>,
}

impl Filesystem {
	pub fn new() -> Self {
		Self {
			default_config: home_dir().map(|h| h.join(CONFIG_PATH)),
		}
	}

	/// Reads the whole ledger at once.
	pub fn read_ledger(&self, path: &Path) -> Result<String, Error> {
		fs::read_to_string(path).map_err(|e| {
			anyhow!("unable to read ledger {}: {}", path.display(), e)
		})
	}

	/// Replaces the ledger in a single write.
	pub fn write_ledger(&self, path: &Path, content: &str) -> Result<(), Error> {
		fs::write(path, content).map_err(|e| {
			anyhow!("unable to write ledger {}: {}", path.display(), e)
		})
	}

	/// Fetches the config from the given path, or default path if none.
	/// A missing default config just means defaults; a missing custom one
	/// is an error.
	pub fn get_config(
		&self,
		custom_config_path: Option<&Path>,
	) -> Result<Config, Error> {
		let config_path = match custom_config_path {
			Some(p) => {
				if !p.exists() {
					bail!("config file {} does not exist", p.display())
				}
				p.to_path_buf()
			},
			None => match &self.default_config {
				Some(p) if p.exists() => p.clone(),
				_ => {
					debug!("no config file found; using defaults");
					return Ok(Config::default());
				},
			},
		};

		let content = fs::read_to_string(&config_path).map_err(|e| {
			anyhow!("unable to read config {}: {}", config_path.display(), e)
		})?;
		let config: Config = toml::from_str(&content)
			.map_err(|e| anyhow!("failed to parse config: {}", e))?;
		config.validate()?;

		debug!("using config {}", config_path.display());
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn no_home() -> Filesystem {
		Filesystem {
			default_config: None,
		}
	}

	#[test]
	fn test_missing_default_config_is_default() {
		let config = no_home().get_config(None).unwrap();
		assert_eq!(config.precision(), 3);
	}

	#[test]
	fn test_missing_custom_config_fails() {
		let result =
			no_home().get_config(Some(Path::new("/nonexistent/pricer.toml")));
		assert!(result.is_err());
	}

	#[test]
	fn test_custom_config() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[prices]\nprecision = 5").unwrap();

		let config = no_home().get_config(Some(file.path())).unwrap();
		assert_eq!(config.precision(), 5);
	}

	#[test]
	fn test_invalid_config_fails() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[prices]\ndate_format = \"%Q\"").unwrap();
		assert!(no_home().get_config(Some(file.path())).is_err());

		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "this is = = not toml").unwrap();
		assert!(no_home().get_config(Some(file.path())).is_err());
	}

	#[test]
	fn test_read_and_write_ledger() {
		let file = NamedTempFile::new().unwrap();
		let fs = no_home();

		fs.write_ledger(file.path(), "2024-01-01 price A 1 B\r\n")
			.unwrap();
		assert_eq!(
			fs.read_ledger(file.path()).unwrap(),
			"2024-01-01 price A 1 B\r\n"
		);
	}

	#[test]
	fn test_missing_ledger_names_path() {
		let err = no_home()
			.read_ledger(Path::new("/nonexistent/ledger.beancount"))
			.unwrap_err();
		assert!(err
			.to_string()
			.starts_with("unable to read ledger /nonexistent/ledger.beancount"));
	}
}
