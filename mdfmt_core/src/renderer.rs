use std::path::Path;

use markdown::mdast::AlignKind;
use markdown::mdast::Code;
use markdown::mdast::Definition;
use markdown::mdast::FootnoteDefinition;
use markdown::mdast::List;
pub use markdown::mdast::Node;
use markdown::mdast::Table;

use crate::MdfmtError;
use crate::MdfmtResult;
use crate::OptionSet;
use crate::OptionValue;
use crate::escape::could_start_block;
use crate::escape::escape_title;
use crate::escape::format_destination;
use crate::inline::FlowText;
use crate::inline::InlineMode;
use crate::inline::backtick_runs;
use crate::inline::collapse_whitespace;
use crate::inline::node_name;
use crate::inline::render_flow;
use crate::inline::render_inlines;
use crate::parser::detect_line_ending;

/// Width of the thematic break written for every `***`, `---` or `___`.
pub const THEMATIC_BREAK_WIDTH: usize = 70;

/// Information about the document being rendered, beyond its tree.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
	/// The raw source text, before line ending normalization.
	pub source: &'a str,
	/// The file the source was read from. `None` for standard input.
	pub origin: Option<&'a Path>,
}

/// Turns a parsed markdown tree back into markdown text.
///
/// The engine parses each target, hands the tree to a renderer, and compares
/// the HTML of the input and output when validation is enabled.
pub trait Renderer {
	fn render(&self, tree: &Node, context: &RenderContext<'_>, options: &OptionSet) -> MdfmtResult<String>;
}

/// How paragraphs are wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
	/// Keep the line breaks of the source.
	Keep,
	/// Put every paragraph on a single line.
	No,
	/// Fill paragraphs up to this many columns.
	Columns(usize),
}

/// Which line ending the output uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLine {
	Lf,
	Crlf,
	/// Use the first line ending found in the source, or LF.
	Keep,
}

/// The renderer options understood by [`MdRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
	pub wrap: Wrap,
	/// Number ordered list items consecutively instead of repeating the
	/// first number.
	pub number: bool,
	pub end_of_line: EndOfLine,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			wrap: Wrap::Keep,
			number: false,
			end_of_line: EndOfLine::Lf,
		}
	}
}

impl RenderSettings {
	/// Read settings from renderer options. Unknown keys are ignored so that
	/// other renderers can share the same option set.
	pub fn from_options(options: &OptionSet) -> MdfmtResult<Self> {
		let mut settings = Self::default();

		if let Some(value) = options.get("wrap") {
			settings.wrap = match value {
				OptionValue::Integer(columns) if *columns > 0 => {
					Wrap::Columns(usize::try_from(*columns).unwrap_or(usize::MAX))
				}
				OptionValue::String(mode) if mode == "keep" => Wrap::Keep,
				OptionValue::String(mode) if mode == "no" => Wrap::No,
				other => {
					return Err(invalid_option(
						"wrap",
						format!("expected `keep`, `no` or a positive integer, found `{other}`"),
					));
				}
			};
		}

		if let Some(value) = options.get("number") {
			settings.number = value.as_bool().ok_or_else(|| {
				invalid_option("number", format!("expected `true` or `false`, found `{value}`"))
			})?;
		}

		if let Some(value) = options.get("end_of_line") {
			settings.end_of_line = match value.as_str() {
				Some("lf") => EndOfLine::Lf,
				Some("crlf") => EndOfLine::Crlf,
				Some("keep") => EndOfLine::Keep,
				_ => {
					return Err(invalid_option(
						"end_of_line",
						format!("expected `lf`, `crlf` or `keep`, found `{value}`"),
					));
				}
			};
		}

		Ok(settings)
	}
}

fn invalid_option(name: &str, reason: String) -> MdfmtError {
	MdfmtError::InvalidOptionValue {
		name: name.to_string(),
		reason,
	}
}

/// The built-in CommonMark renderer.
///
/// Output is canonical: ATX headings, fenced code, `-` bullets and `.`
/// ordered markers (alternating with `*` and `)` for adjacent lists), `*`
/// emphasis and `**` strong emphasis, padded tables and a single trailing
/// newline. Formatting its own output again yields the same text.
#[derive(Debug, Default, Clone, Copy)]
pub struct MdRenderer;

impl Renderer for MdRenderer {
	fn render(&self, tree: &Node, context: &RenderContext<'_>, options: &OptionSet) -> MdfmtResult<String> {
		let settings = RenderSettings::from_options(options)?;
		let writer = BlockWriter {
			settings: &settings,
		};

		let body = match tree {
			Node::Root(root) => writer.blocks(&root.children, 0, false)?,
			other => writer.block(other, 0)?,
		};

		let mut text = body.trim_end_matches('\n').to_string();
		if !text.is_empty() {
			text.push('\n');
		}

		let line_ending = match settings.end_of_line {
			EndOfLine::Lf => "\n",
			EndOfLine::Crlf => "\r\n",
			EndOfLine::Keep => detect_line_ending(context.source).unwrap_or("\n"),
		};

		if line_ending == "\n" {
			Ok(text)
		} else {
			Ok(text.replace('\n', line_ending))
		}
	}
}

/// Marker state for a run of adjacent lists. Two lists of the same kind next
/// to each other would merge unless their markers differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListMarker {
	Bullet(char),
	Ordered(char),
}

struct BlockWriter<'a> {
	settings: &'a RenderSettings,
}

impl BlockWriter<'_> {
	/// Render sibling blocks. `indent` is the column the blocks start at,
	/// used to narrow the wrap width.
	fn blocks(&self, nodes: &[Node], indent: usize, tight: bool) -> MdfmtResult<String> {
		let mut parts = Vec::with_capacity(nodes.len());
		let mut previous: Option<ListMarker> = None;

		for node in nodes {
			if let Node::List(list) = node {
				let marker = next_marker(list.ordered, previous);
				parts.push(self.list(list, indent, marker)?);
				previous = Some(marker);
			} else {
				parts.push(self.block(node, indent)?);
				previous = None;
			}
		}

		Ok(parts.join(if tight { "\n" } else { "\n\n" }))
	}

	fn block(&self, node: &Node, indent: usize) -> MdfmtResult<String> {
		let rendered = match node {
			Node::Paragraph(paragraph) => self.paragraph(&paragraph.children, indent)?,
			Node::Heading(heading) => {
				let content = render_inlines(&heading.children, InlineMode::SingleLine)?;
				let content = escape_closing_hashes(content.trim_matches([' ', '\t']));
				let hashes = "#".repeat(usize::from(heading.depth));
				if content.is_empty() {
					hashes
				} else {
					format!("{hashes} {content}")
				}
			}
			Node::ThematicBreak(_) => "_".repeat(THEMATIC_BREAK_WIDTH),
			Node::Blockquote(quote) => {
				let inner = self.blocks(&quote.children, indent + 2, false)?;
				prefix_lines(&inner, "> ", ">")
			}
			Node::List(list) => self.list(list, indent, next_marker(list.ordered, None))?,
			Node::Code(code) => fenced_code(code),
			Node::Math(math) => format!("$$\n{}\n$$", math.value),
			Node::Html(html) => html.value.clone(),
			Node::Definition(definition) => definition_line(definition),
			Node::Table(table) => render_table(table)?,
			Node::FootnoteDefinition(footnote) => self.footnote(footnote, indent)?,
			Node::Yaml(yaml) => format!("---\n{}\n---", yaml.value),
			Node::Toml(toml) => format!("+++\n{}\n+++", toml.value),
			other => return Err(MdfmtError::UnsupportedNode(node_name(other).to_string())),
		};

		Ok(rendered)
	}

	fn paragraph(&self, children: &[Node], indent: usize) -> MdfmtResult<String> {
		let text = match self.settings.wrap {
			Wrap::Keep => render_inlines(children, InlineMode::Keep)?,
			Wrap::No => fill(&render_flow(children)?, None),
			Wrap::Columns(columns) => {
				fill(&render_flow(children)?, Some(columns.saturating_sub(indent).max(1)))
			}
		};

		Ok(text.trim_end_matches([' ', '\t']).to_string())
	}

	fn list(&self, list: &List, indent: usize, marker: ListMarker) -> MdfmtResult<String> {
		let loose = is_loose(list);
		let start = u64::from(list.start.unwrap_or(1));
		let mut items = Vec::with_capacity(list.children.len());

		for (index, child) in list.children.iter().enumerate() {
			let Node::ListItem(item) = child else {
				return Err(MdfmtError::UnsupportedNode(node_name(child).to_string()));
			};

			let marker_text = match marker {
				ListMarker::Bullet(bullet) => bullet.to_string(),
				ListMarker::Ordered(delimiter) => {
					let number = if self.settings.number {
						start + index as u64
					} else {
						start
					};
					format!("{number}{delimiter}")
				}
			};
			let width = marker_text.len() + 1;

			let mut content = self.blocks(&item.children, indent + width, !loose)?;
			if let Some(checked) = item.checked {
				let task = if checked { "[x]" } else { "[ ]" };
				content = if content.is_empty() {
					task.to_string()
				} else {
					format!("{task} {content}")
				};
			}

			items.push(hang(&marker_text, width, &content));
		}

		Ok(items.join(if loose { "\n\n" } else { "\n" }))
	}

	fn footnote(&self, footnote: &FootnoteDefinition, indent: usize) -> MdfmtResult<String> {
		let label = footnote.label.as_deref().unwrap_or(&footnote.identifier);
		let marker = format!("[^{label}]:");
		let content = self.blocks(&footnote.children, indent + 4, false)?;
		Ok(hang(&marker, 4, &content))
	}
}

/// Whether a list is loose: a blank line separates two of its items, or two
/// direct children of one item. Blank lines after the last item do not count.
/// Trees without positions fall back to the `spread` flags.
pub(crate) fn is_loose(list: &List) -> bool {
	blank_line_inside(&list.children).unwrap_or_else(|| {
		list.spread
			|| list
				.children
				.iter()
				.any(|child| matches!(child, Node::ListItem(item) if item.spread))
	})
}

/// `None` when a node has no position.
fn blank_line_inside(items: &[Node]) -> Option<bool> {
	let mut previous_end: Option<usize> = None;

	for item in items {
		let start = item.position()?.start.line;
		if previous_end.is_some_and(|end| start > end + 1) {
			return Some(true);
		}

		let mut child_end: Option<usize> = None;
		for child in item.children().map_or(&[][..], Vec::as_slice) {
			let child_start = child.position()?.start.line;
			if child_end.is_some_and(|end| child_start > end + 1) {
				return Some(true);
			}
			child_end = Some(content_end(child)?);
		}

		previous_end = Some(child_end.unwrap_or(start));
	}

	Some(false)
}

/// The last line holding content of `node`. Containers may end after blank
/// lines that follow their last child, so they are measured by that child.
fn content_end(node: &Node) -> Option<usize> {
	match node {
		Node::List(_) | Node::ListItem(_) | Node::Blockquote(_) | Node::FootnoteDefinition(_) => {
			match node.children().and_then(|children| children.last()) {
				Some(last) => content_end(last),
				None => node.position().map(|position| position.start.line),
			}
		}
		_ => node.position().map(|position| position.end.line),
	}
}

fn render_table(table: &Table) -> MdfmtResult<String> {
	let columns = table.align.len();
	let mut rows: Vec<Vec<String>> = Vec::with_capacity(table.children.len());

	for row in &table.children {
		let Node::TableRow(row) = row else {
			return Err(MdfmtError::UnsupportedNode(node_name(row).to_string()));
		};
		let mut cells = Vec::with_capacity(columns);
		for cell in &row.children {
			let Node::TableCell(cell) = cell else {
				return Err(MdfmtError::UnsupportedNode(node_name(cell).to_string()));
			};
			let content = render_inlines(&cell.children, InlineMode::TableCell)?;
			cells.push(content.trim_matches([' ', '\t']).to_string());
		}
		cells.resize(columns, String::new());
		rows.push(cells);
	}

	let mut widths = vec![3; columns];
	for row in &rows {
		for (width, cell) in widths.iter_mut().zip(row) {
			*width = (*width).max(cell.chars().count());
		}
	}

	let delimiter = table
		.align
		.iter()
		.zip(&widths)
		.map(|(align, &width)| {
			match align {
				AlignKind::Left => format!(":{}", "-".repeat(width - 1)),
				AlignKind::Right => format!("{}:", "-".repeat(width - 1)),
				AlignKind::Center => format!(":{}:", "-".repeat(width - 2)),
				AlignKind::None => "-".repeat(width),
			}
		})
		.collect::<Vec<_>>();

	let mut lines = Vec::with_capacity(rows.len() + 1);
	for (index, row) in rows.iter().enumerate() {
		let cells = row
			.iter()
			.zip(&table.align)
			.zip(&widths)
			.map(|((cell, align), &width)| pad_cell(cell, align, width))
			.collect::<Vec<_>>();
		lines.push(format!("| {} |", cells.join(" | ")));
		if index == 0 {
			lines.push(format!("| {} |", delimiter.join(" | ")));
		}
	}

	Ok(lines.join("\n"))
}

fn next_marker(ordered: bool, previous: Option<ListMarker>) -> ListMarker {
	match (ordered, previous) {
		(false, Some(ListMarker::Bullet('-'))) => ListMarker::Bullet('*'),
		(false, _) => ListMarker::Bullet('-'),
		(true, Some(ListMarker::Ordered('.'))) => ListMarker::Ordered(')'),
		(true, _) => ListMarker::Ordered('.'),
	}
}

/// Put `marker` in front of the first line of `content` and indent the rest
/// by `width` columns. Blank lines stay empty.
fn hang(marker: &str, width: usize, content: &str) -> String {
	if content.is_empty() {
		return marker.to_string();
	}

	let padding = " ".repeat(width);
	let mut out = String::with_capacity(content.len() + marker.len() + 1);
	for (index, line) in content.split('\n').enumerate() {
		if index == 0 {
			out.push_str(marker);
			out.push(' ');
		} else {
			out.push('\n');
			if !line.is_empty() {
				out.push_str(&padding);
			}
		}
		out.push_str(line);
	}
	out
}

fn prefix_lines(content: &str, prefix: &str, empty_prefix: &str) -> String {
	if content.is_empty() {
		return empty_prefix.to_string();
	}

	content
		.split('\n')
		.map(|line| {
			if line.is_empty() {
				empty_prefix.to_string()
			} else {
				format!("{prefix}{line}")
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// A trailing run of `#` preceded by a space would be read as the closing
/// sequence of the heading.
fn escape_closing_hashes(content: &str) -> String {
	let trimmed = content.trim_end_matches('#');
	if trimmed.len() == content.len() {
		return content.to_string();
	}

	if trimmed.is_empty() || trimmed.ends_with([' ', '\t']) {
		format!("{trimmed}\\{}", &content[trimmed.len()..])
	} else {
		content.to_string()
	}
}

fn fenced_code(code: &Code) -> String {
	let info = match (&code.lang, &code.meta) {
		(Some(lang), Some(meta)) => format!("{lang} {meta}"),
		(Some(lang), None) => lang.clone(),
		(None, Some(meta)) => meta.clone(),
		(None, None) => String::new(),
	};

	let fence_char = if info.contains('`') { '~' } else { '`' };
	let longest = if fence_char == '`' {
		backtick_runs(&code.value).into_iter().max().unwrap_or(0)
	} else {
		longest_run(&code.value, '~')
	};
	let fence = fence_char.to_string().repeat((longest + 1).max(3));

	if code.value.is_empty() {
		format!("{fence}{info}\n{fence}")
	} else {
		format!("{fence}{info}\n{}\n{fence}", code.value)
	}
}

fn longest_run(value: &str, target: char) -> usize {
	let mut longest = 0;
	let mut current = 0;
	for ch in value.chars() {
		if ch == target {
			current += 1;
			longest = longest.max(current);
		} else {
			current = 0;
		}
	}
	longest
}

fn definition_line(definition: &Definition) -> String {
	let label = collapse_whitespace(definition.label.as_deref().unwrap_or(&definition.identifier));
	let mut line = format!("[{label}]: {}", format_destination(&definition.url));
	if let Some(title) = &definition.title {
		line.push_str(" \"");
		line.push_str(&escape_title(title));
		line.push('"');
	}
	line
}

fn pad_cell(cell: &str, align: &AlignKind, width: usize) -> String {
	let gap = width.saturating_sub(cell.chars().count());
	match align {
		AlignKind::Right => format!("{}{cell}", " ".repeat(gap)),
		AlignKind::Center => {
			let left = gap / 2;
			format!("{}{cell}{}", " ".repeat(left), " ".repeat(gap - left))
		}
		AlignKind::Left | AlignKind::None => format!("{cell}{}", " ".repeat(gap)),
	}
}

/// Fill text produced in flow mode. Each hard line is wrapped greedily at
/// `width` columns, or joined onto one line when `width` is `None`. A line
/// never starts with a word that could begin a block.
fn fill(flow: &FlowText, width: Option<usize>) -> String {
	let mut lines = Vec::new();

	for words in flow.lines() {
		let mut current = String::new();
		let mut current_width = 0;

		for word in words {
			let word_width = word.chars().count();
			if current.is_empty() {
				current.push_str(word);
				current_width = word_width;
				continue;
			}

			let fits = width.is_none_or(|width| current_width + 1 + word_width <= width);
			if fits || could_start_block(word) {
				current.push(' ');
				current.push_str(word);
				current_width += 1 + word_width;
			} else {
				lines.push(std::mem::take(&mut current));
				current.push_str(word);
				current_width = word_width;
			}
		}

		lines.push(current);
	}

	lines.join("\n")
}
