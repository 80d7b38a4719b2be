use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdfmtError {
	#[error(transparent)]
	#[diagnostic(code(mdfmt::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to access `{path}`: {source}")]
	#[diagnostic(code(mdfmt::file_io))]
	FileIo {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failure to parse markdown: {0}")]
	#[diagnostic(code(mdfmt::markdown))]
	Markdown(String),

	#[error("invalid -e option `{0}`: expected KEY=VALUE")]
	#[diagnostic(
		code(mdfmt::invalid_env_option),
		help("pass renderer options as `-e key=value`, for example `-e wrap=80`")
	)]
	InvalidEnvOption(String),

	#[error("invalid value for renderer option `{name}`: {reason}")]
	#[diagnostic(code(mdfmt::invalid_option_value))]
	InvalidOptionValue { name: String, reason: String },

	#[error("file \"{0}\" does not exist")]
	#[diagnostic(code(mdfmt::path_not_found))]
	PathNotFound(String),

	#[error("could not format \"{path}\": the output renders to different HTML than the input")]
	#[diagnostic(
		code(mdfmt::not_equivalent),
		help("this is a formatter bug; pass `--no-validate` to write the output anyway")
	)]
	NotEquivalent { path: String },

	#[error("unsupported markdown node: `{0}`")]
	#[diagnostic(code(mdfmt::unsupported_node))]
	UnsupportedNode(String),

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(
		code(mdfmt::config_parse),
		help("check that the config is valid TOML with `exclude`, `validate` and/or [options]")
	)]
	ConfigParse { path: String, reason: String },

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(mdfmt::invalid_exclude_pattern))]
	InvalidExcludePattern { pattern: String, reason: String },

	#[error("{0}")]
	#[diagnostic(code(mdfmt::usage))]
	Usage(String),
}

impl MdfmtError {
	pub(crate) fn file_io(path: &std::path::Path, source: std::io::Error) -> Self {
		Self::FileIo {
			path: path.display().to_string(),
			source,
		}
	}
}

pub type MdfmtResult<T> = Result<T, MdfmtError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
