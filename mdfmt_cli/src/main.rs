use std::process;

use clap::Parser;
use mdfmt_cli::MdfmtCli;
use mdfmt_cli::execute;
use mdfmt_core::MdRenderer;
use mdfmt_core::Streams;
use tracing_subscriber::EnvFilter;

fn main() {
	let args = MdfmtCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = args.use_color();
	if !use_color {
		owo_colors::set_override(false);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose);

	let stdin = std::io::stdin();
	let stdout = std::io::stdout();
	let stderr = std::io::stderr();
	let mut stdin = stdin.lock();
	let mut stdout = stdout.lock();
	let mut stderr = stderr.lock();
	let mut streams = Streams {
		stdin: &mut stdin,
		stdout: &mut stdout,
		stderr: &mut stderr,
	};

	let result = execute(&args, &MdRenderer, &mut streams);
	streams.stdout.flush().ok();
	streams.stderr.flush().ok();

	match result {
		Ok(result) => process::exit(result.exit_code()),
		Err(e) => {
			let report: miette::Report = e.into();
			eprintln!("{report:?}");
			process::exit(2);
		}
	}
}

/// Logs go to stderr. `MDFMT_LOG` takes an `EnvFilter` directive and
/// defaults to `warn`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
	let default = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env("MDFMT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.without_time()
		.with_target(false)
		.init();
}
