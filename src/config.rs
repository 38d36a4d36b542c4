//! Process configuration, read once at startup.

use std::{net::IpAddr, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{key} is invalid: {value:?}")]
	Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub host: IpAddr,
	pub port: u16,
	pub jwt_secret: String,
	pub jwt_ttl_hours: i64,
	pub upload_dir: PathBuf,
	/// Base url that stored images are served under, without a trailing slash.
	pub public_url: String,
	/// Directory that import files must live in.
	pub import_dir: PathBuf,
	pub otlp_endpoint: Option<String>,
}

impl Config {
	/// Reads the configuration from the environment, after loading `.env` if present.
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, which is `std::env::var` outside of tests.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		let required = |key: &'static str| get(key).ok_or(Error::Missing(key));

		fn parse<T: std::str::FromStr>(
			key: &'static str,
			value: Option<String>,
			default: T,
		) -> Result<T, Error> {
			match value {
				Some(value) => value.parse().map_err(|_| Error::Invalid { key, value }),
				None => Ok(default),
			}
		}

		let port = parse("PORT", get("PORT"), 3000)?;
		let jwt_ttl_hours = parse("JWT_TTL_HOURS", get("JWT_TTL_HOURS"), 24)?;

		if jwt_ttl_hours <= 0 {
			return Err(Error::Invalid {
				key: "JWT_TTL_HOURS",
				value: jwt_ttl_hours.to_string(),
			});
		}

		Ok(Self {
			database_url: required("DATABASE_URL")?,
			host: parse("HOST", get("HOST"), IpAddr::from([127, 0, 0, 1]))?,
			port,
			jwt_secret: required("JWT_SECRET")?,
			jwt_ttl_hours,
			upload_dir: get("UPLOAD_DIR").map_or_else(|| "uploads".into(), PathBuf::from),
			public_url: get("PUBLIC_URL")
				.map_or_else(|| format!("http://localhost:{port}"), |url| {
					url.trim_end_matches('/').to_owned()
				}),
			import_dir: get("IMPORT_DIR").map_or_else(|| "data".into(), PathBuf::from),
			otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
		})
	}
}
