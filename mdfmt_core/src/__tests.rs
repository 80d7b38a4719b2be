use std::io::Cursor;
use std::path::PathBuf;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::*;

fn options(pairs: &[(&str, OptionValue)]) -> OptionSet {
	pairs
		.iter()
		.map(|(key, value)| ((*key).to_string(), value.clone()))
		.collect()
}

fn format(input: &str) -> MdfmtResult<String> {
	format_markdown(input, &OptionSet::new())
}

#[rstest]
#[case::integer("80", OptionValue::Integer(80))]
#[case::negative("-3", OptionValue::Integer(-3))]
#[case::true_capitalized("True", OptionValue::Boolean(true))]
#[case::true_lowercase("true", OptionValue::Boolean(true))]
#[case::false_capitalized("False", OptionValue::Boolean(false))]
#[case::string("keep", OptionValue::String("keep".into()))]
#[case::empty("", OptionValue::String(String::new()))]
fn coerce_option_values(#[case] raw: &str, #[case] expected: OptionValue) {
	assert_eq!(OptionValue::coerce(raw), expected);
}

#[test]
fn parse_env_options_splits_on_first_equals() -> MdfmtResult<()> {
	let parsed = parse_env_options(["a=1", "b=c", "d=True", "url=x=y"])?;
	let expected = options(&[
		("a", OptionValue::Integer(1)),
		("b", "c".into()),
		("d", true.into()),
		("url", "x=y".into()),
	]);
	assert_eq!(parsed, expected);

	Ok(())
}

#[test]
fn parse_env_options_last_duplicate_wins() -> MdfmtResult<()> {
	let parsed = parse_env_options(["wrap=80", "wrap=no"])?;
	assert_eq!(parsed, options(&[("wrap", "no".into())]));

	Ok(())
}

#[test]
fn parse_env_options_rejects_missing_equals() {
	let result = parse_env_options(["wrap"]);
	assert!(matches!(result, Err(MdfmtError::InvalidEnvOption(token)) if token == "wrap"));
}

#[test]
fn merge_options_prefers_overrides() {
	let defaults = options(&[("wrap", OptionValue::Integer(80)), ("number", true.into())]);
	let overrides = options(&[("wrap", "no".into())]);
	let merged = merge_options(&defaults, &overrides);
	assert_eq!(merged, options(&[("number", true.into()), ("wrap", "no".into())]));
}

#[rstest]
#[case::empty("", "")]
#[case::only_blank_lines("\n\n\n", "")]
#[case::surrounding_blank_lines("\n\n# A header\n\n", "# A header\n")]
#[case::missing_final_newline("text", "text\n")]
#[case::setext_level_one("Setext\n======\n", "# Setext\n")]
#[case::setext_level_two("Sub\n---\n", "## Sub\n")]
#[case::closed_atx("## Closed ##\n", "## Closed\n")]
#[case::literal_closing_hash("# foo \\#\n", "# foo \\#\n")]
#[case::star_bullets("* a\n* b\n", "- a\n- b\n")]
#[case::plus_bullets("+ a\n+ b\n", "- a\n- b\n")]
#[case::paren_ordered("1) one\n2) two\n", "1. one\n1. two\n")]
#[case::ordered_start("3. a\n4. b\n", "3. a\n3. b\n")]
#[case::nested_list("- a\n    - b\n", "- a\n  - b\n")]
#[case::loose_list("- a\n\n- b\n", "- a\n\n- b\n")]
#[case::adjacent_bullet_lists("- a\n\n\n* b\n", "- a\n\n* b\n")]
#[case::list_before_heading("- a\n\n\n# H\n", "- a\n\n# H\n")]
#[case::ordered_list_before_code("1. a\n\n\n```\nx\n```\n", "1. a\n\n```\nx\n```\n")]
#[case::quoted_list_before_paragraph("> - a\n>\n>\n> b\n", "> - a\n>\n> b\n")]
#[case::trailing_blank_lines_keep_list_tight("- a\n- b\n\n\nText\n", "- a\n- b\n\nText\n")]
#[case::blank_line_inside_item("- a\n\n  b\n- c\n", "- a\n\n  b\n\n- c\n")]
#[case::loose_nested_list("- a\n  - b\n\n  - c\n- d\n", "- a\n  - b\n\n  - c\n- d\n")]
#[case::task_list("- [ ] todo\n- [x] done\n", "- [ ] todo\n- [x] done\n")]
#[case::underscore_emphasis("__strong__ and _em_\n", "**strong** and *em*\n")]
#[case::strong_emphasis("***both***\n", "***both***\n")]
#[case::emphasis_inside_strong("**_x_**\n", "**_x_**\n")]
#[case::strikethrough("~~gone~~\n", "~~gone~~\n")]
#[case::intraword_underscore("snake_case_name\n", "snake_case_name\n")]
#[case::escaped_marker("\\* not a list\n", "\\* not a list\n")]
#[case::escaped_heading("\\# not a heading\n", "\\# not a heading\n")]
#[case::hard_break("foo  \nbar\n", "foo\\\nbar\n")]
#[case::trailing_spaces("foo   \nbar\n", "foo\\\nbar\n")]
#[case::indented_code("    code\n", "```\ncode\n```\n")]
#[case::tilde_fence("~~~rust\nfn main() {}\n~~~\n", "```rust\nfn main() {}\n```\n")]
#[case::thematic_break_stars("***\n", "______________________________________________________________________\n")]
#[case::thematic_break_spaced("- - -\n", "______________________________________________________________________\n")]
#[case::lazy_blockquote("> quote\nlazy\n", "> quote\n> lazy\n")]
#[case::blockquote_list("> - a\n> - b\n", "> - a\n> - b\n")]
#[case::inline_link("[text](http://a.com \"T\")\n", "[text](http://a.com \"T\")\n")]
#[case::autolink("<https://example.com>\n", "<https://example.com>\n")]
#[case::literal_url("see https://example.com\n", "see <https://example.com>\n")]
#[case::www_literal("www.example.com\n", "www.example.com\n")]
#[case::image("![alt](img.png)\n", "![alt](img.png)\n")]
#[case::shortcut_reference("[foo]\n\n[foo]: /url\n", "[foo]\n\n[foo]: /url\n")]
#[case::footnote("Text[^1].\n\n[^1]: Note.\n", "Text[^1].\n\n[^1]: Note.\n")]
#[case::code_span_with_backtick("`` a`b ``\n", "``a`b``\n")]
#[case::html_block("<div>\nhi\n</div>\n", "<div>\nhi\n</div>\n")]
#[case::front_matter("---\ntitle: x\n---\n# H\n", "---\ntitle: x\n---\n\n# H\n")]
fn render_canonical_form(#[case] input: &str, #[case] expected: &str) -> MdfmtResult<()> {
	assert_eq!(format(input)?, expected);

	Ok(())
}

#[test]
fn render_table_pads_cells() -> MdfmtResult<()> {
	let input = "|a|b|\n|-|:-:|\n|long cell|x|\n";
	let expected = "| a         |  b  |\n| --------- | :-: |\n| long cell |  x  |\n";
	assert_eq!(format(input)?, expected);

	Ok(())
}

#[rstest]
#[case::no_wrap(OptionValue::from("no"), "a\nb\nc\n", "a b c\n")]
#[case::keep(OptionValue::from("keep"), "a\nb\n", "a\nb\n")]
#[case::columns(OptionValue::Integer(10), "aaa bbb ccc ddd\n", "aaa bbb\nccc ddd\n")]
#[case::never_starts_line_with_marker(OptionValue::Integer(3), "aa - bb\n", "aa -\nbb\n")]
#[case::hard_break_survives(OptionValue::from("no"), "a\nb\\\nc\n", "a b\\\nc\n")]
#[case::control_character_joined(OptionValue::from("no"), "a\u{1f}b\nc\n", "a\u{1f}b c\n")]
#[case::control_character_filled(OptionValue::Integer(3), "a\u{1f}b c\n", "a\u{1f}b\nc\n")]
#[case::code_span_never_broken(OptionValue::Integer(4), "`a b c` d\n", "`a b c`\nd\n")]
fn render_wrap_modes(#[case] wrap: OptionValue, #[case] input: &str, #[case] expected: &str) -> MdfmtResult<()> {
	let formatted = format_markdown(input, &options(&[("wrap", wrap)]))?;
	assert_eq!(formatted, expected);

	Ok(())
}

#[test]
fn render_consecutive_numbers() -> MdfmtResult<()> {
	let formatted = format_markdown("1. a\n1. b\n1. c\n", &options(&[("number", true.into())]))?;
	assert_eq!(formatted, "1. a\n2. b\n3. c\n");

	Ok(())
}

#[rstest]
#[case::crlf("crlf", "# a\n\ntext\n", "# a\r\n\r\ntext\r\n")]
#[case::lf("lf", "a\r\nb\r\n", "a\nb\n")]
#[case::keep_crlf("keep", "a\r\nb\r\n", "a\r\nb\r\n")]
#[case::keep_lf("keep", "a\nb\n", "a\nb\n")]
fn render_line_endings(#[case] end_of_line: &str, #[case] input: &str, #[case] expected: &str) -> MdfmtResult<()> {
	let formatted = format_markdown(input, &options(&[("end_of_line", end_of_line.into())]))?;
	assert_eq!(formatted, expected);

	Ok(())
}

#[rstest]
#[case::wrap_word("wrap", OptionValue::from("maybe"))]
#[case::wrap_zero("wrap", OptionValue::Integer(0))]
#[case::number_integer("number", OptionValue::Integer(1))]
#[case::end_of_line("end_of_line", OptionValue::from("cr"))]
fn render_rejects_invalid_option_values(#[case] name: &str, #[case] value: OptionValue) {
	let result = format_markdown("text\n", &options(&[(name, value)]));
	assert!(matches!(result, Err(MdfmtError::InvalidOptionValue { name: found, .. }) if found == name));
}

#[test]
fn render_ignores_unknown_options() -> MdfmtResult<()> {
	let formatted = format_markdown("text\n", &options(&[("colour", "blue".into())]))?;
	assert_eq!(formatted, "text\n");

	Ok(())
}

const KITCHEN_SINK: &str = r#"---
title: Demo
---

Heading
=======

Some *emphasis*, __strong__ and `code`.
A second line with a [link](https://example.com "Title").

* one
* two
    * nested

1) first
2) second

> quote
continued

| a | b |
|---|--:|
| 1 | 2 |

    indented code

***

Final paragraph with a footnote[^note] and www.example.com.

[^note]: The footnote.
"#;

#[rstest]
#[case::keep("keep")]
#[case::no("no")]
#[case::narrow("narrow")]
fn formatting_is_idempotent(#[case] wrap: &str) -> MdfmtResult<()> {
	let wrap = if wrap == "narrow" {
		OptionValue::Integer(20)
	} else {
		OptionValue::from(wrap)
	};
	let options = options(&[("wrap", wrap)]);
	let once = format_markdown(KITCHEN_SINK, &options)?;
	let twice = format_markdown(&once, &options)?;
	assert_eq!(once, twice);
	assert!(is_equivalent(KITCHEN_SINK, &once)?);

	Ok(())
}

struct ConstantRenderer(&'static str);

impl Renderer for ConstantRenderer {
	fn render(&self, _tree: &Node, _context: &RenderContext<'_>, _options: &OptionSet) -> MdfmtResult<String> {
		Ok(self.0.to_string())
	}
}

#[test]
fn validation_rejects_changed_meaning() {
	let renderer = ConstantRenderer("something else\n");
	let options = OptionSet::new();
	let engine = FormatEngine::new(&renderer, &options);
	let result = engine.format_text("# Title\n", Some(std::path::Path::new("doc.md")));
	assert!(matches!(result, Err(MdfmtError::NotEquivalent { path }) if path == "doc.md"));
}

#[test]
fn validation_can_be_disabled() -> MdfmtResult<()> {
	let renderer = ConstantRenderer("something else\n");
	let options = OptionSet::new();
	let engine = FormatEngine::new(&renderer, &options).with_validation(false);
	assert_eq!(engine.format_text("# Title\n", None)?, "something else\n");

	Ok(())
}

#[test]
fn validation_ignores_whitespace_differences() -> MdfmtResult<()> {
	assert!(is_equivalent("a\nb\n", "a b\n")?);
	assert!(!is_equivalent("*a*\n", "a\n")?);

	Ok(())
}

#[rstest]
#[case::blank_lines_after_list("- a\n\n\n* b\n", "- a\n\n* b\n", true)]
#[case::blank_lines_in_blockquote("> - a\n>\n>\n> b\n", "> - a\n>\n> b\n", true)]
#[case::tight_to_loose("- a\n- b\n", "- a\n\n- b\n", false)]
#[case::loose_to_tight("- a\n\n- b\n", "- a\n- b\n", false)]
#[case::merged_items("- a\n- b\n", "- a b\n", false)]
fn validation_compares_list_looseness(#[case] original: &str, #[case] formatted: &str, #[case] expected: bool) -> MdfmtResult<()> {
	assert_eq!(is_equivalent(original, formatted)?, expected);

	Ok(())
}

#[test]
fn control_characters_survive_without_validation() -> MdfmtResult<()> {
	let options = options(&[("wrap", "no".into())]);
	let engine = FormatEngine::new(&MdRenderer, &options).with_validation(false);
	assert_eq!(engine.format_text("a\u{1f}b\n", None)?, "a\u{1f}b\n");

	Ok(())
}

#[test]
fn process_stdin_echoes_output() -> MdfmtResult<()> {
	let options = OptionSet::new();
	let engine = FormatEngine::new(&MdRenderer, &options);
	let mut stdin = Cursor::new("* a\n".as_bytes());
	let mut stdout = Vec::new();
	let mut stderr = Vec::new();
	let mut streams = Streams {
		stdin: &mut stdin,
		stdout: &mut stdout,
		stderr: &mut stderr,
	};

	let report = engine.process(&Target::Stdin, Mode::Write, &mut streams)?;
	assert_eq!(report.outcome, Outcome::Reformatted);
	assert_eq!(String::from_utf8_lossy(&stdout), "- a\n");

	Ok(())
}

#[test]
fn process_check_mode_leaves_files_untouched() -> MdfmtResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let path = tmp.path().join("doc.md");
	std::fs::write(&path, "Title\n=====\n")?;

	let options = OptionSet::new();
	let engine = FormatEngine::new(&MdRenderer, &options);
	let mut stdin = Cursor::new(Vec::new());
	let mut stdout = Vec::new();
	let mut stderr = Vec::new();
	let mut streams = Streams {
		stdin: &mut stdin,
		stdout: &mut stdout,
		stderr: &mut stderr,
	};

	let report = engine.process(&Target::File(path.clone()), Mode::Check, &mut streams)?;
	assert_eq!(report.outcome, Outcome::NeedsFormatting);
	assert_eq!(report.formatted, "# Title\n");
	assert_eq!(std::fs::read_to_string(&path)?, "Title\n=====\n");

	let report = engine.process(&Target::File(path.clone()), Mode::Write, &mut streams)?;
	assert_eq!(report.outcome, Outcome::Reformatted);
	assert_eq!(std::fs::read_to_string(&path)?, "# Title\n");

	let report = engine.process(&Target::File(path), Mode::Check, &mut streams)?;
	assert_eq!(report.outcome, Outcome::Unchanged);
	assert!(stdout.is_empty());

	Ok(())
}

#[test]
#[traced_test]
fn process_logs_each_target() {
	let options = OptionSet::new();
	let engine = FormatEngine::new(&MdRenderer, &options);
	let mut stdin = Cursor::new("text\n".as_bytes());
	let mut stdout = Vec::new();
	let mut stderr = Vec::new();
	let mut streams = Streams {
		stdin: &mut stdin,
		stdout: &mut stdout,
		stderr: &mut stderr,
	};

	let report = engine
		.process(&Target::Stdin, Mode::Check, &mut streams)
		.unwrap_or_else(|e| panic!("process: {e}"));
	assert_eq!(report.outcome, Outcome::Unchanged);
	assert!(logs_contain("formatted"));
}

fn markdown_fixture() -> tempfile::TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for name in ["b.md", "a.md", "notes.txt"] {
		std::fs::write(tmp.path().join(name), "# Doc\n").unwrap_or_else(|e| panic!("write: {e}"));
	}
	std::fs::create_dir(tmp.path().join("sub")).unwrap_or_else(|e| panic!("mkdir: {e}"));
	std::fs::write(tmp.path().join("sub/nested.md"), "# Nested\n").unwrap_or_else(|e| panic!("write: {e}"));
	tmp
}

#[test]
fn resolve_directory_is_shallow_and_sorted() -> MdfmtResult<()> {
	let tmp = markdown_fixture();
	let exclude = build_exclude_matcher(tmp.path(), &[])?;
	let targets = resolve_targets(&[tmp.path().to_path_buf()], &exclude)?;
	assert_eq!(targets, vec![
		Target::File(tmp.path().join("a.md")),
		Target::File(tmp.path().join("b.md")),
	]);

	Ok(())
}

#[test]
fn resolve_removes_duplicates() -> MdfmtResult<()> {
	let tmp = markdown_fixture();
	let exclude = build_exclude_matcher(tmp.path(), &[])?;
	let file = tmp.path().join("a.md");
	let paths = vec![
		file.clone(),
		PathBuf::from("-"),
		tmp.path().to_path_buf(),
		PathBuf::from("-"),
	];
	let targets = resolve_targets(&paths, &exclude)?;
	assert_eq!(targets, vec![
		Target::File(file),
		Target::Stdin,
		Target::File(tmp.path().join("b.md")),
	]);

	Ok(())
}

#[test]
fn resolve_rejects_missing_paths() -> MdfmtResult<()> {
	let tmp = markdown_fixture();
	let exclude = build_exclude_matcher(tmp.path(), &[])?;
	let missing = tmp.path().join("missing.md");
	let result = resolve_targets(&[missing], &exclude);
	assert!(matches!(result, Err(MdfmtError::PathNotFound(path)) if path.ends_with("missing.md")));

	Ok(())
}

#[test]
fn resolve_applies_exclude_to_directory_scans_only() -> MdfmtResult<()> {
	let tmp = markdown_fixture();
	let exclude = build_exclude_matcher(tmp.path(), &["b.md".to_string()])?;

	let scanned = resolve_targets(&[tmp.path().to_path_buf()], &exclude)?;
	assert_eq!(scanned, vec![Target::File(tmp.path().join("a.md"))]);

	let explicit = resolve_targets(&[tmp.path().join("b.md")], &exclude)?;
	assert_eq!(explicit, vec![Target::File(tmp.path().join("b.md"))]);

	Ok(())
}

#[test]
fn load_config_from_root() -> MdfmtResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::write(
		tmp.path().join("mdfmt.toml"),
		"exclude = [\"drafts/\"]\nvalidate = false\n\n[options]\nwrap = 80\nnumber = true\nend_of_line = \"crlf\"\n",
	)?;

	let config = MdfmtConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config should load"));
	assert_eq!(config.exclude, vec!["drafts/".to_string()]);
	assert!(!config.validate);
	assert_eq!(config.options, options(&[
		("end_of_line", "crlf".into()),
		("number", true.into()),
		("wrap", OptionValue::Integer(80)),
	]));
	assert_eq!(config.root, std::path::absolute(tmp.path())?);

	Ok(())
}

#[test]
fn load_config_from_dot_config_directory() -> MdfmtResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::create_dir(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/mdfmt.toml"), "exclude = [\"b.md\"]\n")?;

	let config = MdfmtConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config should load"));
	assert!(config.validate);
	assert_eq!(config.root, std::path::absolute(tmp.path())?);

	let matcher = config.exclude_matcher()?;
	assert!(is_excluded(&matcher, &tmp.path().join("b.md")));
	assert!(!is_excluded(&matcher, &tmp.path().join("a.md")));

	Ok(())
}

#[test]
fn load_config_missing_returns_none() -> MdfmtResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	assert!(MdfmtConfig::load(tmp.path())?.is_none());

	Ok(())
}

#[test]
fn load_config_reports_invalid_toml() -> MdfmtResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::write(tmp.path().join("mdfmt.toml"), "exclude = [\n")?;

	let result = MdfmtConfig::load(tmp.path());
	assert!(matches!(result, Err(MdfmtError::ConfigParse { .. })));

	Ok(())
}

#[rstest]
#[case::heading("#tag", true)]
#[case::dash("-", true)]
#[case::ordered("1.", true)]
#[case::ordered_paren("12)", true)]
#[case::plain("word", false)]
#[case::number("2024", false)]
fn detects_block_starting_words(#[case] word: &str, #[case] expected: bool) {
	assert_eq!(could_start_block(word), expected);
}

#[rstest]
#[case::star("a*b", "a\\*b")]
#[case::line_start_hash("# x", "\\# x")]
#[case::line_start_ordered("1. x", "1\\. x")]
#[case::line_start_rule("---", "\\---")]
#[case::entity("&amp;", "\\&amp;")]
#[case::plain_ampersand("a & b", "a & b")]
#[case::boundary_underscore("_x", "\\_x")]
fn escapes_literal_text(#[case] text: &str, #[case] expected: &str) {
	assert_eq!(escape_text(text, None, true), expected);
}
