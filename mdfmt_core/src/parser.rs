use markdown::Constructs;
use markdown::Options;
use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_html_with_options;
use markdown::to_mdast;

use crate::MdfmtError;
use crate::MdfmtResult;

/// Parse options shared by formatting and validation: GitHub flavored
/// markdown plus YAML/TOML front matter.
pub fn parse_options() -> ParseOptions {
	ParseOptions {
		constructs: Constructs {
			frontmatter: true,
			..Constructs::gfm()
		},
		..ParseOptions::gfm()
	}
}

/// Parse markdown content into an mdast tree.
pub fn parse_markdown(content: impl AsRef<str>) -> MdfmtResult<Node> {
	let content = normalize_line_endings(content.as_ref());
	to_mdast(&content, &parse_options()).map_err(|e| MdfmtError::Markdown(e.to_string()))
}

/// Render markdown to HTML with the same constructs used for parsing.
pub fn markdown_to_html(content: impl AsRef<str>) -> MdfmtResult<String> {
	let options = Options {
		parse: parse_options(),
		..Options::gfm()
	};
	let content = normalize_line_endings(content.as_ref());
	to_html_with_options(&content, &options).map_err(|e| MdfmtError::Markdown(e.to_string()))
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// The first line ending used in `content`, if any.
pub fn detect_line_ending(content: &str) -> Option<&'static str> {
	let index = content.find(['\r', '\n'])?;
	if content[index..].starts_with("\r\n") {
		Some("\r\n")
	} else if content[index..].starts_with('\r') {
		Some("\r")
	} else {
		Some("\n")
	}
}
