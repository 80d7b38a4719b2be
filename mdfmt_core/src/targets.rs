use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;

use crate::MdfmtError;
use crate::MdfmtResult;
use crate::config::is_excluded;

/// The path argument which selects standard input and output.
pub const STDIN_SENTINEL: &str = "-";

/// A single unit of formatting work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
	/// Read from standard input, write to standard output.
	Stdin,
	/// An absolute path to a file on disk.
	File(PathBuf),
}

impl Target {
	pub fn path(&self) -> Option<&Path> {
		match self {
			Self::Stdin => None,
			Self::File(path) => Some(path),
		}
	}
}

impl fmt::Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Stdin => f.write_str(STDIN_SENTINEL),
			Self::File(path) => write!(f, "{}", path.display()),
		}
	}
}

/// Expand path arguments into targets.
///
/// Directories are scanned one level deep for `*.md` files. Files matched by
/// `exclude` are skipped, but only when they were found through a directory.
/// Every target appears once, in argument order, with directory contents
/// sorted by path.
pub fn resolve_targets(paths: &[PathBuf], exclude: &Gitignore) -> MdfmtResult<Vec<Target>> {
	let mut targets = Vec::new();
	let mut seen = HashSet::new();

	for path in paths {
		if path.as_os_str() == STDIN_SENTINEL {
			push_unique(&mut targets, &mut seen, Target::Stdin);
			continue;
		}

		if path.is_file() {
			let absolute = absolute_path(path)?;
			push_unique(&mut targets, &mut seen, Target::File(absolute));
		} else if path.is_dir() {
			for file in collect_markdown_files(path)? {
				if is_excluded(exclude, &file) {
					tracing::debug!(path = %file.display(), "excluded by config");
					continue;
				}
				push_unique(&mut targets, &mut seen, Target::File(file));
			}
		} else {
			return Err(MdfmtError::PathNotFound(path.display().to_string()));
		}
	}

	Ok(targets)
}

fn push_unique(targets: &mut Vec<Target>, seen: &mut HashSet<Target>, target: Target) {
	if seen.insert(target.clone()) {
		targets.push(target);
	}
}

fn absolute_path(path: &Path) -> MdfmtResult<PathBuf> {
	std::path::absolute(path).map_err(|e| MdfmtError::file_io(path, e))
}

/// Collect the markdown files directly inside `dir`. Subdirectories are not
/// entered.
fn collect_markdown_files(dir: &Path) -> MdfmtResult<Vec<PathBuf>> {
	let dir = absolute_path(dir)?;
	let entries = std::fs::read_dir(&dir).map_err(|e| MdfmtError::file_io(&dir, e))?;
	let mut files = Vec::new();

	for entry in entries {
		let entry = entry.map_err(|e| MdfmtError::file_io(&dir, e))?;
		let path = entry.path();

		if path.is_file() && is_markdown_file(&path) {
			files.push(path);
		}
	}

	// Sort for deterministic ordering.
	files.sort();
	Ok(files)
}

/// Check if a file has the markdown suffix.
pub fn is_markdown_file(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext == "md")
}
