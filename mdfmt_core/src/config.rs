use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Deserialize;

use crate::MdfmtError;
use crate::MdfmtResult;
use crate::OptionSet;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdfmt.toml", ".mdfmt.toml", ".config/mdfmt.toml"];

/// Configuration loaded from an `mdfmt.toml` file.
///
/// ```toml
/// exclude = ["drafts/", "*.generated.md"]
/// validate = true
///
/// [options]
/// wrap = 80
/// number = true
/// end_of_line = "lf"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MdfmtConfig {
	/// Gitignore-style patterns for files to skip when a directory is
	/// scanned. Files named explicitly on the command line are always
	/// formatted.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// Check that the formatted output renders to the same HTML as the
	/// input before writing it. Defaults to `true`.
	#[serde(default = "default_validate")]
	pub validate: bool,
	/// Default renderer options. `-e key=value` arguments override these.
	#[serde(default)]
	pub options: OptionSet,
	/// Directory the config was loaded from. Exclude patterns are relative
	/// to it.
	#[serde(skip)]
	pub root: PathBuf,
}

impl Default for MdfmtConfig {
	fn default() -> Self {
		Self {
			exclude: Vec::new(),
			validate: true,
			options: OptionSet::new(),
			root: PathBuf::from("."),
		}
	}
}

fn default_validate() -> bool {
	true
}

impl MdfmtConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> MdfmtResult<Option<MdfmtConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load the config from an explicit path. Exclude patterns are resolved
	/// relative to the directory containing the file.
	pub fn load_file(path: &Path) -> MdfmtResult<MdfmtConfig> {
		let content = std::fs::read_to_string(path).map_err(|e| MdfmtError::file_io(path, e))?;
		let mut config: MdfmtConfig =
			toml::from_str(&content).map_err(|e| MdfmtError::ConfigParse {
				path: path.display().to_string(),
				reason: e.to_string(),
			})?;

		let parent = match path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};
		let parent = std::path::absolute(parent).map_err(|e| MdfmtError::file_io(parent, e))?;
		// A `.config/mdfmt.toml` belongs to the directory above `.config`.
		config.root = if parent.file_name().is_some_and(|name| name == ".config") {
			parent.parent().map_or_else(|| parent.clone(), Path::to_path_buf)
		} else {
			parent
		};

		tracing::debug!(path = %path.display(), "loaded config");
		Ok(config)
	}

	/// Build a matcher for the `exclude` patterns.
	pub fn exclude_matcher(&self) -> MdfmtResult<Gitignore> {
		build_exclude_matcher(&self.root, &self.exclude)
	}
}

/// Check whether `path` (a file) is matched by `matcher`, either directly or
/// through one of its parent directories.
pub fn is_excluded(matcher: &Gitignore, path: &Path) -> bool {
	if matcher.is_empty() {
		return false;
	}

	if path.starts_with(matcher.path()) {
		matcher
			.matched_path_or_any_parents(path, false)
			.is_ignore()
	} else {
		matcher.matched(path, false).is_ignore()
	}
}

/// Build a `Gitignore` matcher from exclude patterns. These follow
/// `.gitignore` syntax.
pub fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MdfmtResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder
			.add_line(None, pattern)
			.map_err(|e| {
				MdfmtError::InvalidExcludePattern {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;
	}

	builder.build().map_err(|e| {
		MdfmtError::InvalidExcludePattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}
