use std::ffi::OsString;
use std::io::Write;

use clap::Parser;
use mdfmt_core::FormatEngine;
use mdfmt_core::FormatReport;
use mdfmt_core::MdfmtConfig;
use mdfmt_core::MdfmtError;
use mdfmt_core::MdfmtResult;
use mdfmt_core::Mode;
use mdfmt_core::Outcome;
use mdfmt_core::Renderer;
use mdfmt_core::Streams;
use mdfmt_core::merge_options;
use mdfmt_core::parse_env_options;
use mdfmt_core::resolve_targets;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use similar::ChangeTag;
use similar::TextDiff;

use crate::MdfmtCli;

/// The outcome of a whole invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunResult {
	/// Number of targets that were formatted or checked.
	pub targets: usize,
	/// Targets rewritten in write mode.
	pub changed: Vec<String>,
	/// Targets that need formatting, in check mode.
	pub unformatted: Vec<String>,
}

impl RunResult {
	/// Returns true if no target needs formatting.
	pub fn is_ok(&self) -> bool {
		self.unformatted.is_empty()
	}

	/// The process exit status: `0` on success and `1` when check mode found
	/// unformatted targets.
	pub fn exit_code(&self) -> i32 {
		i32::from(!self.is_ok())
	}
}

/// Parse `args` (without the program name) and run the formatter.
///
/// Argument errors, including `--help` and `--version`, are returned as
/// [`MdfmtError::Usage`] carrying clap's rendered message.
pub fn run<I, T>(args: I, renderer: &dyn Renderer, streams: &mut Streams<'_>) -> MdfmtResult<RunResult>
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	let argv = std::iter::once(OsString::from("mdfmt")).chain(args.into_iter().map(Into::into));
	let cli = MdfmtCli::try_parse_from(argv).map_err(|e| MdfmtError::Usage(e.to_string()))?;
	execute(&cli, renderer, streams)
}

/// Run the formatter for already parsed arguments.
pub fn execute(cli: &MdfmtCli, renderer: &dyn Renderer, streams: &mut Streams<'_>) -> MdfmtResult<RunResult> {
	let env_options = parse_env_options(&cli.options)?;

	// Nothing is read, not even the config file, without path arguments.
	if cli.paths.is_empty() {
		tracing::debug!("no targets to format");
		return Ok(RunResult::default());
	}

	let config = load_config(cli)?;
	let options = merge_options(&config.options, &env_options);
	let exclude = config.exclude_matcher()?;
	let targets = resolve_targets(&cli.paths, &exclude)?;

	let mut result = RunResult {
		targets: targets.len(),
		..RunResult::default()
	};

	if targets.is_empty() {
		tracing::debug!("no targets to format");
		return Ok(result);
	}

	let validate = config.validate && !cli.no_validate;
	let mode = if cli.check { Mode::Check } else { Mode::Write };
	let engine = FormatEngine::new(renderer, &options).with_validation(validate);
	tracing::debug!(targets = targets.len(), ?mode, validate, "formatting");

	for target in &targets {
		let report = engine.process(target, mode, streams)?;
		match report.outcome {
			Outcome::Unchanged => {}
			Outcome::Reformatted => result.changed.push(target.to_string()),
			Outcome::NeedsFormatting => {
				report_unformatted(streams.stderr, &report, cli.diff)?;
				result.unformatted.push(target.to_string());
			}
		}
	}

	Ok(result)
}

fn load_config(cli: &MdfmtCli) -> MdfmtResult<MdfmtConfig> {
	if let Some(path) = &cli.config {
		return MdfmtConfig::load_file(path);
	}

	let root = std::env::current_dir()?;
	Ok(MdfmtConfig::load(&root)?.unwrap_or_default())
}

fn report_unformatted(stderr: &mut dyn Write, report: &FormatReport, diff: bool) -> MdfmtResult<()> {
	writeln!(
		stderr,
		"{} file \"{}\" is not formatted",
		"error:".if_supports_color(Stream::Stderr, |text| text.red()),
		report.target
	)?;

	if diff {
		write_diff(stderr, &report.original, &report.formatted)?;
	}

	Ok(())
}

fn write_diff(stderr: &mut dyn Write, original: &str, formatted: &str) -> MdfmtResult<()> {
	let diff = TextDiff::from_lines(original, formatted);
	for change in diff.iter_all_changes() {
		let line = match change.tag() {
			ChangeTag::Delete => {
				format!("-{change}")
					.if_supports_color(Stream::Stderr, |text| text.red())
					.to_string()
			}
			ChangeTag::Insert => {
				format!("+{change}")
					.if_supports_color(Stream::Stderr, |text| text.green())
					.to_string()
			}
			ChangeTag::Equal => format!(" {change}"),
		};
		write!(stderr, "  {line}")?;
		if change.missing_newline() {
			writeln!(stderr)?;
		}
	}

	Ok(())
}
