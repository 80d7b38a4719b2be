use std::path::PathBuf;

use clap::Parser;

pub use crate::run::RunResult;
pub use crate::run::execute;
pub use crate::run::run;

pub mod run;

#[derive(Debug, Parser)]
#[command(
	name = "mdfmt",
	author,
	version,
	about = "Format markdown files into a canonical form.",
	long_about = "mdfmt parses CommonMark (with GitHub flavored tables, task lists, \
	              strikethrough, footnotes and front matter) and writes it back in one \
	              canonical style. Formatting an already formatted file changes nothing.\n\n\
	              Quick start:\n  mdfmt README.md      Format a file in place\n  mdfmt docs     \
	              Format every *.md file directly inside docs\n  mdfmt --check .      \
	              Exit with status 1 if anything needs formatting\n  cat a.md | mdfmt -    \
	              Format standard input to standard output"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct MdfmtCli {
	/// Files, directories or `-` for standard input. Directories are scanned
	/// one level deep for `*.md` files.
	#[arg(value_name = "PATH")]
	pub paths: Vec<PathBuf>,

	/// Do not write files. Exit with status 1 if any file would be
	/// reformatted.
	#[arg(long, default_value_t = false)]
	pub check: bool,

	/// Set a renderer option, for example `-e wrap=80` or `-e number=true`.
	/// Values are read as integers, then booleans, then text.
	#[arg(short = 'e', value_name = "KEY=VALUE")]
	pub options: Vec<String>,

	/// With `--check`, print a unified diff for every file that would be
	/// reformatted.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Skip checking that the output renders to the same HTML as the input.
	#[arg(long, default_value_t = false)]
	pub no_validate: bool,

	/// Path to a config file. Defaults to `mdfmt.toml`, `.mdfmt.toml` or
	/// `.config/mdfmt.toml` in the working directory.
	#[arg(long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl MdfmtCli {
	/// Color is disabled by `--no-color` or the `NO_COLOR` environment
	/// variable.
	pub fn use_color(&self) -> bool {
		!self.no_color && std::env::var_os("NO_COLOR").is_none()
	}
}
