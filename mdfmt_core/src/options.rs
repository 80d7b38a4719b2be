use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::MdfmtError;
use crate::MdfmtResult;

/// A typed renderer option value parsed from `-e key=value` or loaded from
/// the `[options]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
	Integer(i64),
	Boolean(bool),
	String(String),
}

impl OptionValue {
	/// Coerce a raw command line value. Integers win over boolean literals,
	/// so `1` and `0` stay integers.
	pub fn coerce(raw: &str) -> Self {
		if let Ok(value) = raw.parse::<i64>() {
			return Self::Integer(value);
		}

		match raw {
			"True" | "true" => Self::Boolean(true),
			"False" | "false" => Self::Boolean(false),
			_ => Self::String(raw.to_string()),
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Boolean(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Self::Integer(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value.as_str()),
			_ => None,
		}
	}
}

impl fmt::Display for OptionValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Integer(value) => write!(f, "{value}"),
			Self::Boolean(value) => write!(f, "{value}"),
			Self::String(value) => write!(f, "{value}"),
		}
	}
}

impl From<i64> for OptionValue {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}

impl From<bool> for OptionValue {
	fn from(value: bool) -> Self {
		Self::Boolean(value)
	}
}

impl From<&str> for OptionValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

/// Renderer configuration shared by every render call of a run.
pub type OptionSet = BTreeMap<String, OptionValue>;

/// Parse `key=value` tokens into an [`OptionSet`].
///
/// Each token is split on its first `=`. Later duplicates replace earlier
/// ones. A token without `=` is rejected.
pub fn parse_env_options<I, S>(tokens: I) -> MdfmtResult<OptionSet>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut options = OptionSet::new();

	for token in tokens {
		let token = token.as_ref();
		let Some((key, value)) = token.split_once('=') else {
			return Err(MdfmtError::InvalidEnvOption(token.to_string()));
		};

		tracing::debug!(key, value, "parsed -e option");
		options.insert(key.to_string(), OptionValue::coerce(value));
	}

	Ok(options)
}

/// Overlay `overrides` on top of `defaults`, with `overrides` winning.
pub fn merge_options(defaults: &OptionSet, overrides: &OptionSet) -> OptionSet {
	let mut merged = defaults.clone();
	merged.extend(
		overrides
			.iter()
			.map(|(key, value)| (key.clone(), value.clone())),
	);
	merged
}
