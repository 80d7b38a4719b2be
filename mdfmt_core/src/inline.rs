use markdown::mdast::Image;
use markdown::mdast::ImageReference;
use markdown::mdast::Link;
use markdown::mdast::LinkReference;
use markdown::mdast::Node;
use markdown::mdast::ReferenceKind;

use crate::MdfmtError;
use crate::MdfmtResult;
use crate::escape::escape_label;
use crate::escape::escape_text;
use crate::escape::escape_title;
use crate::escape::format_destination;

/// How whitespace inside inline content is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InlineMode {
	/// Soft line breaks are kept where the source had them.
	Keep,
	/// Spaces and soft line breaks become single spaces recorded as wrap
	/// points, to be filled later.
	Flow,
	/// Everything on one line (headings).
	SingleLine,
	/// Like [`InlineMode::SingleLine`], with pipes in code spans escaped.
	TableCell,
}

/// Inline content rendered in [`InlineMode::Flow`].
#[derive(Debug, Default)]
pub(crate) struct FlowText {
	pub text: String,
	/// Byte offsets of the spaces in `text` where a line may be broken, in
	/// increasing order. Other spaces, such as those inside code spans or
	/// link destinations, are never broken.
	pub wrap_points: Vec<usize>,
}

impl FlowText {
	/// The words of every hard line. Words are the text between wrap points.
	pub(crate) fn lines(&self) -> Vec<Vec<&str>> {
		let mut lines = Vec::new();
		let mut line = Vec::new();
		let mut start = 0;
		let ends = self
			.wrap_points
			.iter()
			.copied()
			.chain(std::iter::once(self.text.len()));

		for end in ends {
			for (index, part) in self.text[start..end].split('\n').enumerate() {
				if index > 0 {
					lines.push(std::mem::take(&mut line));
				}
				if !part.is_empty() {
					line.push(part);
				}
			}
			start = end + 1;
		}

		lines.push(line);
		lines
	}
}

/// Render a sequence of inline nodes.
pub(crate) fn render_inlines(nodes: &[Node], mode: InlineMode) -> MdfmtResult<String> {
	let mut writer = InlineWriter::new(mode);
	writer.write_all(nodes)?;
	Ok(writer.out)
}

/// Render inline nodes for a paragraph that will be filled.
pub(crate) fn render_flow(nodes: &[Node]) -> MdfmtResult<FlowText> {
	let mut writer = InlineWriter::new(InlineMode::Flow);
	writer.write_all(nodes)?;
	Ok(FlowText {
		text: writer.out,
		wrap_points: writer.wrap_points,
	})
}

struct InlineWriter {
	out: String,
	mode: InlineMode,
	wrap_points: Vec<usize>,
}

impl InlineWriter {
	fn new(mode: InlineMode) -> Self {
		Self {
			out: String::new(),
			mode,
			wrap_points: Vec::new(),
		}
	}

	fn write_all(&mut self, nodes: &[Node]) -> MdfmtResult<()> {
		for (index, node) in nodes.iter().enumerate() {
			let next = nodes.get(index + 1);
			self.write_node(node, next)?;
		}
		Ok(())
	}

	fn write_node(&mut self, node: &Node, next: Option<&Node>) -> MdfmtResult<()> {
		match node {
			Node::Text(text) => self.write_text(&text.value),
			Node::Emphasis(emphasis) => {
				// Directly after another delimiter, `_` keeps the two runs apart.
				let delimiter = if self.prev_char() == Some('*') && !starts_alphanumeric(next) {
					"_"
				} else {
					"*"
				};
				self.out.push_str(delimiter);
				self.write_all(&emphasis.children)?;
				self.out.push_str(delimiter);
			}
			Node::Strong(strong) => {
				self.out.push_str("**");
				self.write_all(&strong.children)?;
				self.out.push_str("**");
			}
			Node::Delete(delete) => {
				self.out.push_str("~~");
				self.write_all(&delete.children)?;
				self.out.push_str("~~");
			}
			Node::InlineCode(code) => {
				let span = code_span(&code.value);
				if self.mode == InlineMode::TableCell {
					self.out.push_str(&span.replace('|', "\\|"));
				} else {
					self.out.push_str(&span);
				}
			}
			Node::InlineMath(math) => {
				self.out.push('$');
				self.out.push_str(&math.value);
				self.out.push('$');
			}
			Node::Break(_) => {
				if self.is_single_line() {
					self.out.push(' ');
				} else {
					self.trim_trailing_space();
					self.out.push_str("\\\n");
				}
			}
			Node::Html(html) => {
				if self.is_single_line() {
					self.out.push_str(&html.value.replace('\n', " "));
				} else {
					self.out.push_str(&html.value);
				}
			}
			Node::Link(link) => self.write_link(link)?,
			Node::LinkReference(reference) => self.write_link_reference(reference)?,
			Node::Image(image) => self.write_image(image),
			Node::ImageReference(reference) => self.write_image_reference(reference),
			Node::FootnoteReference(reference) => {
				let label = reference.label.as_deref().unwrap_or(&reference.identifier);
				self.out.push_str("[^");
				self.out.push_str(label);
				self.out.push(']');
			}
			other => return Err(MdfmtError::UnsupportedNode(node_name(other).to_string())),
		}

		Ok(())
	}

	fn write_text(&mut self, value: &str) {
		match self.mode {
			InlineMode::Keep => {
				for (index, line) in value.split('\n').enumerate() {
					if index > 0 {
						self.trim_trailing_space();
						self.out.push('\n');
					}
					let at_line_start = self.at_line_start();
					let line = if at_line_start {
						line.trim_start_matches([' ', '\t'])
					} else {
						line
					};
					let escaped = escape_text(line, self.prev_char(), at_line_start);
					self.out.push_str(&escaped);
				}
			}
			InlineMode::Flow | InlineMode::SingleLine | InlineMode::TableCell => {
				let mut word = String::new();
				for ch in value.chars() {
					if matches!(ch, ' ' | '\t' | '\n') {
						self.flush_word(&mut word);
						if self.mode == InlineMode::Flow {
							self.wrap_points.push(self.out.len());
						}
						self.out.push(' ');
					} else {
						word.push(ch);
					}
				}
				self.flush_word(&mut word);
			}
		}
	}

	fn flush_word(&mut self, word: &mut String) {
		if word.is_empty() {
			return;
		}
		let at_line_start = self.mode == InlineMode::Flow && self.at_line_start();
		let escaped = escape_text(word, self.prev_char(), at_line_start);
		self.out.push_str(&escaped);
		word.clear();
	}

	fn write_link(&mut self, link: &Link) -> MdfmtResult<()> {
		if let Some(autolink) = autolink(link) {
			self.out.push_str(&autolink);
			return Ok(());
		}

		self.escape_trailing_bang();
		self.out.push('[');
		self.write_all(&link.children)?;
		self.out.push_str("](");
		self.out.push_str(&format_destination(&link.url));
		push_title(&mut self.out, link.title.as_deref());
		self.out.push(')');
		Ok(())
	}

	fn write_link_reference(&mut self, reference: &LinkReference) -> MdfmtResult<()> {
		let label = reference.label.as_deref().unwrap_or(&reference.identifier);
		self.escape_trailing_bang();
		self.out.push('[');
		let start = self.out.len();
		self.write_all(&reference.children)?;
		let text = self.out[start..].to_string();
		self.out.push(']');
		push_reference_label(&mut self.out, &reference.reference_kind, &text, label);
		Ok(())
	}

	fn write_image(&mut self, image: &Image) {
		self.out.push_str("![");
		self.out.push_str(&escape_label(&image.alt));
		self.out.push_str("](");
		self.out.push_str(&format_destination(&image.url));
		push_title(&mut self.out, image.title.as_deref());
		self.out.push(')');
	}

	fn write_image_reference(&mut self, reference: &ImageReference) {
		let alt = escape_label(&reference.alt);
		let label = reference.label.as_deref().unwrap_or(&reference.identifier);
		self.out.push_str("![");
		self.out.push_str(&alt);
		self.out.push(']');
		push_reference_label(&mut self.out, &reference.reference_kind, &alt, label);
	}

	fn is_single_line(&self) -> bool {
		matches!(self.mode, InlineMode::SingleLine | InlineMode::TableCell)
	}

	/// A literal `!` right before a link would turn it into an image.
	fn escape_trailing_bang(&mut self) {
		if !self.out.ends_with('!') {
			return;
		}
		let before = &self.out[..self.out.len() - 1];
		let backslashes = before.len() - before.trim_end_matches('\\').len();
		if backslashes % 2 == 0 {
			self.out.insert(self.out.len() - 1, '\\');
		}
	}

	fn prev_char(&self) -> Option<char> {
		self.out.chars().next_back()
	}

	/// Whether the next character starts a line, once any trailing wrap
	/// points have been filled.
	fn at_line_start(&self) -> bool {
		let mut end = self.out.len();
		for &point in self.wrap_points.iter().rev() {
			if point + 1 != end {
				break;
			}
			end = point;
		}
		let trimmed = &self.out[..end];
		trimmed.is_empty() || trimmed.ends_with('\n')
	}

	fn trim_trailing_space(&mut self) {
		let len = self.out.trim_end_matches([' ', '\t']).len();
		self.out.truncate(len);
		while self.wrap_points.last().is_some_and(|&point| point >= len) {
			self.wrap_points.pop();
		}
	}
}

fn starts_alphanumeric(node: Option<&Node>) -> bool {
	match node {
		Some(Node::Text(text)) => text.value.chars().next().is_some_and(char::is_alphanumeric),
		_ => false,
	}
}

fn push_title(out: &mut String, title: Option<&str>) {
	if let Some(title) = title {
		out.push_str(" \"");
		out.push_str(&escape_title(title));
		out.push('"');
	}
}

/// Append the `[label]` / `[]` part of a reference. Collapsed and shortcut
/// references only survive when their text still matches the label.
fn push_reference_label(out: &mut String, kind: &ReferenceKind, text: &str, label: &str) {
	let matches_label = normalize_label(text) == normalize_label(label);
	match kind {
		ReferenceKind::Shortcut if matches_label => {}
		ReferenceKind::Collapsed if matches_label => out.push_str("[]"),
		_ => {
			out.push('[');
			out.push_str(&collapse_whitespace(label));
			out.push(']');
		}
	}
}

/// Labels match case-insensitively and with whitespace collapsed, so a
/// label can always be written on one line.
pub(crate) fn collapse_whitespace(label: &str) -> String {
	label.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_label(label: &str) -> String {
	label
		.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
		.to_lowercase()
}

/// Links that came from `<…>` autolinks or GFM literals are written back in
/// that form.
fn autolink(link: &Link) -> Option<String> {
	if link.title.is_some() {
		return None;
	}

	let [Node::Text(text)] = link.children.as_slice() else {
		return None;
	};
	let text = text.value.as_str();
	let url = link.url.as_str();

	if url
		.chars()
		.any(|ch| ch.is_whitespace() || ch.is_control() || matches!(ch, '<' | '>'))
	{
		return None;
	}

	if text == url && has_scheme(url) {
		return Some(format!("<{url}>"));
	}

	if url.strip_prefix("mailto:") == Some(text) && text.contains('@') {
		return Some(format!("<{text}>"));
	}

	if url.strip_prefix("http://") == Some(text) && text.starts_with("www.") {
		return Some(text.to_string());
	}

	None
}

/// An absolute URI scheme: a letter followed by 1-31 letters, digits, `+`,
/// `.` or `-`, then `:`.
fn has_scheme(url: &str) -> bool {
	let Some((scheme, _)) = url.split_once(':') else {
		return false;
	};
	let mut chars = scheme.chars();
	let starts_with_letter = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic());
	starts_with_letter
		&& (2..=32).contains(&scheme.len())
		&& chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '.' | '-'))
}

/// Wrap `value` in the shortest backtick fence that does not occur inside
/// it.
pub(crate) fn code_span(value: &str) -> String {
	let value = value.replace('\n', " ");
	let runs = backtick_runs(&value);
	let fence_len = (1..).find(|len| !runs.contains(len)).unwrap_or(1);
	let fence = "`".repeat(fence_len);

	let needs_padding = value.starts_with('`')
		|| value.ends_with('`')
		|| (value.starts_with(' ') && value.ends_with(' ') && !value.trim().is_empty());

	if needs_padding {
		format!("{fence} {value} {fence}")
	} else {
		format!("{fence}{value}{fence}")
	}
}

/// Lengths of every run of consecutive backticks in `value`.
pub(crate) fn backtick_runs(value: &str) -> Vec<usize> {
	let mut runs = Vec::new();
	let mut current = 0;
	for ch in value.chars() {
		if ch == '`' {
			current += 1;
		} else if current > 0 {
			runs.push(current);
			current = 0;
		}
	}
	if current > 0 {
		runs.push(current);
	}
	runs
}

pub(crate) fn node_name(node: &Node) -> &'static str {
	match node {
		Node::MdxJsxFlowElement(_) => "mdxJsxFlowElement",
		Node::MdxJsxTextElement(_) => "mdxJsxTextElement",
		Node::MdxjsEsm(_) => "mdxjsEsm",
		Node::MdxFlowExpression(_) => "mdxFlowExpression",
		Node::MdxTextExpression(_) => "mdxTextExpression",
		Node::Root(_) => "root",
		Node::ListItem(_) => "listItem",
		Node::TableRow(_) => "tableRow",
		Node::TableCell(_) => "tableCell",
		_ => "node",
	}
}
