//! Backslash escaping for literal text so that it parses back to the same
//! text instead of markup.

/// Characters that are always escaped in text.
const ALWAYS_ESCAPED: [char; 8] = ['\\', '*', '`', '[', ']', '<', '|', '~'];

/// Escape a single line of literal text.
///
/// `prev` is the character rendered immediately before this text, if any.
/// `at_line_start` marks text that begins a new line of output, where block
/// markers such as `#`, `>` or `- ` must not be interpreted.
pub fn escape_text(text: &str, prev: Option<char>, at_line_start: bool) -> String {
	let chars: Vec<char> = text.chars().collect();
	let mut out = String::with_capacity(text.len() + 8);
	let line_start_escape = if at_line_start {
		line_start_escape_index(&chars)
	} else {
		None
	};

	for (index, &ch) in chars.iter().enumerate() {
		let before = if index == 0 { prev } else { Some(chars[index - 1]) };
		let after = chars.get(index + 1).copied();

		let needs_escape = line_start_escape == Some(index)
			|| ALWAYS_ESCAPED.contains(&ch)
			|| (ch == '_' && is_boundary_underscore(before, after))
			|| (ch == '&' && starts_entity(&chars[index + 1..]))
			|| (matches!(ch, '(' | ':') && before == Some(']'));

		if needs_escape {
			out.push('\\');
		}
		out.push(ch);
	}

	out
}

/// Escape text used as a link label or image description. Line-start rules
/// do not apply there.
pub fn escape_label(text: &str) -> String {
	escape_text(text, None, false)
}

/// Escape a link or definition title for use inside double quotes.
pub fn escape_title(title: &str) -> String {
	let mut out = String::with_capacity(title.len() + 2);
	for ch in title.chars() {
		if matches!(ch, '"' | '\\') {
			out.push('\\');
		}
		out.push(ch);
	}
	out
}

/// Render a link destination, wrapping it in `<…>` when the bare form would
/// not round-trip.
pub fn format_destination(url: &str) -> String {
	let needs_angle = url.is_empty()
		|| url.starts_with('<')
		|| url
			.chars()
			.any(|ch| ch.is_ascii_whitespace() || ch.is_ascii_control())
		|| !has_balanced_parens(url);

	let mut out = String::with_capacity(url.len() + 2);
	if needs_angle {
		out.push('<');
		for ch in url.chars() {
			if matches!(ch, '<' | '>' | '\\') {
				out.push('\\');
			}
			out.push(ch);
		}
		out.push('>');
		return out;
	}

	let chars: Vec<char> = url.chars().collect();
	for (index, &ch) in chars.iter().enumerate() {
		if ch == '\\' || (ch == '&' && starts_entity(&chars[index + 1..])) {
			out.push('\\');
		}
		out.push(ch);
	}
	out
}

fn has_balanced_parens(url: &str) -> bool {
	let mut depth = 0usize;
	for ch in url.chars() {
		match ch {
			'(' => depth += 1,
			')' => {
				if depth == 0 {
					return false;
				}
				depth -= 1;
			}
			_ => {}
		}
	}
	depth == 0
}

/// An underscore next to a non-alphanumeric character (or the edge of the
/// text) could open or close emphasis.
fn is_boundary_underscore(before: Option<char>, after: Option<char>) -> bool {
	!before.is_some_and(char::is_alphanumeric) || !after.is_some_and(char::is_alphanumeric)
}

/// Whether the characters following an `&` form a character reference.
fn starts_entity(rest: &[char]) -> bool {
	let body: Vec<char> = rest
		.iter()
		.copied()
		.take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '#')
		.collect();
	!body.is_empty() && rest.get(body.len()) == Some(&';')
}

/// Index of the character which must be escaped so that a line is not read
/// as the start of a block.
fn line_start_escape_index(chars: &[char]) -> Option<usize> {
	let first = *chars.first()?;
	let second = chars.get(1).copied();
	let is_gap = |ch: Option<char>| ch.is_none_or(|ch| ch == ' ' || ch == '\t');

	match first {
		'#' | '>' => Some(0),
		'-' | '+' | '=' if is_gap(second) || is_rule_line(chars, first) => Some(0),
		digit if digit.is_ascii_digit() => {
			let digits = chars.iter().take_while(|ch| ch.is_ascii_digit()).count();
			let delimiter = chars.get(digits).copied();
			(digits <= 9
				&& matches!(delimiter, Some('.' | ')'))
				&& is_gap(chars.get(digits + 1).copied()))
			.then_some(digits)
		}
		_ => None,
	}
}

/// A line made only of `marker` and spaces, such as `---` or `===`.
fn is_rule_line(chars: &[char], marker: char) -> bool {
	chars.iter().all(|ch| *ch == marker || *ch == ' ' || *ch == '\t')
}

/// Whether a word placed at the start of a line could change how the line
/// is parsed. Wrapping never breaks a line before such a word.
pub fn could_start_block(word: &str) -> bool {
	let Some(first) = word.chars().next() else {
		return false;
	};

	if matches!(first, '#' | '>' | '-' | '+' | '*' | '=' | '_' | '~' | '`' | '|' | '<') {
		return true;
	}

	if first.is_ascii_digit() {
		let digits = word.chars().take_while(char::is_ascii_digit).count();
		return matches!(word.chars().nth(digits), Some('.' | ')'));
	}

	false
}
