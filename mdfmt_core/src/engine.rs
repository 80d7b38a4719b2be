use std::io::Read;
use std::io::Write;
use std::path::Path;

use crate::MdRenderer;
use crate::MdfmtError;
use crate::MdfmtResult;
use crate::Node;
use crate::OptionSet;
use crate::RenderContext;
use crate::Renderer;
use crate::Target;
use crate::parser::markdown_to_html;
use crate::parser::parse_markdown;
use crate::renderer::is_loose;

/// The byte streams used for the `-` target and for diagnostics. Injected so
/// that formatting can run in-process against buffers.
pub struct Streams<'a> {
	pub stdin: &'a mut dyn Read,
	pub stdout: &'a mut dyn Write,
	pub stderr: &'a mut dyn Write,
}

/// Whether formatted output is written back or only compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	Write,
	Check,
}

/// What happened to a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// The input was already formatted.
	Unchanged,
	/// The formatted output differed and was written.
	Reformatted,
	/// Check mode: the formatted output differs from the input.
	NeedsFormatting,
}

/// The result of processing one target.
#[derive(Debug, Clone)]
pub struct FormatReport {
	pub target: Target,
	pub outcome: Outcome,
	/// The input text as read.
	pub original: String,
	/// The rendered text.
	pub formatted: String,
}

/// Parses, renders and validates markdown documents.
pub struct FormatEngine<'a> {
	renderer: &'a dyn Renderer,
	options: &'a OptionSet,
	validate: bool,
}

impl<'a> FormatEngine<'a> {
	/// Create an engine with validation enabled.
	pub fn new(renderer: &'a dyn Renderer, options: &'a OptionSet) -> Self {
		Self {
			renderer,
			options,
			validate: true,
		}
	}

	#[must_use]
	pub fn with_validation(mut self, validate: bool) -> Self {
		self.validate = validate;
		self
	}

	/// Format a document. With validation enabled, the result must render to
	/// the same HTML as `source` and keep every list tight or loose.
	pub fn format_text(&self, source: &str, origin: Option<&Path>) -> MdfmtResult<String> {
		let tree = parse_markdown(source)?;
		let context = RenderContext { source, origin };
		let formatted = self.renderer.render(&tree, &context, self.options)?;

		if self.validate && !is_equivalent(source, &formatted)? {
			let path = origin.map_or_else(|| "-".to_string(), |path| path.display().to_string());
			return Err(MdfmtError::NotEquivalent { path });
		}

		Ok(formatted)
	}

	/// Read, format and (in write mode) store a single target.
	///
	/// Files are only rewritten when the output differs. The `-` target
	/// always echoes the output to stdout in write mode and writes nothing
	/// in check mode.
	pub fn process(&self, target: &Target, mode: Mode, streams: &mut Streams<'_>) -> MdfmtResult<FormatReport> {
		let original = match target {
			Target::Stdin => {
				let mut buffer = String::new();
				streams.stdin.read_to_string(&mut buffer)?;
				buffer
			}
			Target::File(path) => {
				std::fs::read_to_string(path).map_err(|e| MdfmtError::file_io(path, e))?
			}
		};

		let formatted = self.format_text(&original, target.path())?;
		let changed = formatted != original;
		tracing::debug!(path = %target, changed, "formatted");

		let outcome = match (mode, changed) {
			(_, false) => Outcome::Unchanged,
			(Mode::Write, true) => Outcome::Reformatted,
			(Mode::Check, true) => Outcome::NeedsFormatting,
		};

		if mode == Mode::Write {
			match target {
				Target::Stdin => {
					streams.stdout.write_all(formatted.as_bytes())?;
					streams.stdout.flush()?;
				}
				Target::File(path) if changed => {
					std::fs::write(path, &formatted).map_err(|e| MdfmtError::file_io(path, e))?;
				}
				Target::File(_) => {}
			}
		}

		Ok(FormatReport {
			target: target.clone(),
			outcome,
			original,
			formatted,
		})
	}
}

/// Whether two documents are equivalent: they render to the same HTML, up to
/// whitespace and the `<p>` wrapping of list items, and every list is tight
/// or loose in both.
///
/// The HTML of a list followed by two blank lines is loose even when no
/// blank line separates its items, so looseness is compared on the parsed
/// trees instead.
pub fn is_equivalent(original: &str, formatted: &str) -> MdfmtResult<bool> {
	let before = normalize_html(&markdown_to_html(original)?);
	let after = normalize_html(&markdown_to_html(formatted)?);
	if before != after {
		return Ok(false);
	}

	let mut loose_before = Vec::new();
	list_looseness(&parse_markdown(original)?, &mut loose_before);
	let mut loose_after = Vec::new();
	list_looseness(&parse_markdown(formatted)?, &mut loose_after);
	Ok(loose_before == loose_after)
}

/// Collect [`is_loose`] for every list, in document order.
fn list_looseness(node: &Node, out: &mut Vec<bool>) {
	if let Node::List(list) = node {
		out.push(is_loose(list));
	}
	for child in node.children().map_or(&[][..], Vec::as_slice) {
		list_looseness(child, out);
	}
}

/// Elements around which whitespace is not significant.
const BLOCK_TAGS: [&str; 21] = [
	"blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre", "section",
	"table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Elements tracked to know which one holds a paragraph.
const CONTAINER_TAGS: [&str; 5] = ["blockquote", "li", "ol", "section", "ul"];

/// Collapse whitespace runs, drop whitespace next to block tags, and drop
/// the `<p>` tags of paragraphs directly inside a list item.
fn normalize_html(html: &str) -> String {
	let mut out = String::with_capacity(html.len());
	let mut containers: Vec<String> = Vec::new();
	let mut in_item_paragraph = false;
	let mut pending_space = false;
	let mut after_block = true;
	let mut rest = html;

	while let Some(ch) = rest.chars().next() {
		let tag_end = if ch == '<' { rest.find('>') } else { None };
		if let Some(end) = tag_end {
			let tag = &rest[..=end];
			rest = &rest[end + 1..];
			let (closing, name) = tag_name(tag);

			if !BLOCK_TAGS.contains(&name.as_str()) {
				if pending_space {
					out.push(' ');
					pending_space = false;
				}
				out.push_str(tag);
				after_block = false;
				continue;
			}

			pending_space = false;
			after_block = true;

			if name == "p" {
				let in_item = containers.last().is_some_and(|container| container == "li");
				if !closing && in_item {
					in_item_paragraph = true;
					continue;
				}
				if closing && in_item_paragraph {
					in_item_paragraph = false;
					continue;
				}
			}

			if CONTAINER_TAGS.contains(&name.as_str()) {
				if closing {
					containers.pop();
				} else {
					containers.push(name);
				}
			}

			out.push_str(tag);
			continue;
		}

		rest = &rest[ch.len_utf8()..];
		if ch.is_ascii_whitespace() {
			pending_space = !after_block;
		} else {
			if pending_space {
				out.push(' ');
				pending_space = false;
			}
			out.push(ch);
			after_block = false;
		}
	}

	out
}

/// Whether `tag` is a closing tag, and its lowercase name.
fn tag_name(tag: &str) -> (bool, String) {
	let inner = tag.trim_start_matches('<');
	let (closing, inner) = match inner.strip_prefix('/') {
		Some(rest) => (true, rest),
		None => (false, inner),
	};
	let name = inner
		.chars()
		.take_while(char::is_ascii_alphanumeric)
		.collect::<String>()
		.to_ascii_lowercase();
	(closing, name)
}

/// Format markdown text with the built-in renderer and validation enabled.
pub fn format_markdown(text: &str, options: &OptionSet) -> MdfmtResult<String> {
	FormatEngine::new(&MdRenderer, options).format_text(text, None)
}
