mod common;

use mdfmt_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn no_paths_is_a_successful_noop() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.assert()
		.success()
		.stdout("")
		.stderr("");

	Ok(())
}

#[test]
fn formats_file_in_place() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("readme.md");
	std::fs::write(&file, "\n\n# A header\n\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg(&file)
		.assert()
		.success()
		.stdout("");

	assert_eq!(std::fs::read_to_string(&file)?, "# A header\n");

	Ok(())
}

#[test]
fn formats_only_markdown_files_in_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let docs = tmp.path().join("docs");
	std::fs::create_dir_all(docs.join("nested"))?;
	std::fs::write(docs.join("a.md"), "* a\n")?;
	std::fs::write(docs.join("notes.txt"), "* a\n")?;
	std::fs::write(docs.join("nested/b.md"), "* b\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("docs")
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(docs.join("a.md"))?, "- a\n");
	assert_eq!(std::fs::read_to_string(docs.join("notes.txt"))?, "* a\n");
	assert_eq!(std::fs::read_to_string(docs.join("nested/b.md"))?, "* b\n");

	Ok(())
}

#[test]
fn formats_explicit_files_with_any_extension() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("notes.txt");
	std::fs::write(&file, "Title\n=====\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("notes.txt")
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(&file)?, "# Title\n");

	Ok(())
}

#[test]
fn missing_path_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("a.md");
	std::fs::write(&file, "* a\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("a.md")
		.arg("missing.md")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("does not exist"));

	// Resolution fails before anything is written.
	assert_eq!(std::fs::read_to_string(&file)?, "* a\n");

	Ok(())
}

#[test]
fn check_passes_for_formatted_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.md"), "# A header\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("--check")
		.arg("a.md")
		.assert()
		.success()
		.stderr("");

	Ok(())
}

#[test]
fn check_fails_without_modifying_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("a.md");
	std::fs::write(&file, "* a\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("--check")
		.arg("a.md")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("is not formatted").and(predicates::str::contains("a.md")));

	assert_eq!(std::fs::read_to_string(&file)?, "* a\n");

	Ok(())
}

#[test]
fn check_reports_every_unformatted_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("first.md"), "* a\n")?;
	std::fs::write(tmp.path().join("second.md"), "Title\n=====\n")?;
	std::fs::write(tmp.path().join("third.md"), "# Fine\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("--check")
		.arg(".")
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("first.md")
				.and(predicates::str::contains("second.md"))
				.and(predicates::str::contains("third.md").not()),
		);

	Ok(())
}

#[test]
fn check_diff_shows_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.md"), "* a\n")?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.args(["--check", "--diff", "a.md"])
		.assert()
		.code(1)
		.stderr(predicates::str::contains("-* a").and(predicates::str::contains("+- a")));

	Ok(())
}

#[test]
fn stdin_is_formatted_to_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.arg("-")
		.write_stdin("\n\n# A header\n\n")
		.assert()
		.success()
		.stdout("# A header\n");

	assert_eq!(std::fs::read_dir(tmp.path())?.count(), 0);

	Ok(())
}

#[test]
fn env_options_reach_the_renderer() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.args(["-e", "wrap=no", "-e", "number=True", "-"])
		.write_stdin("one\ntwo\n\n1. a\n1. b\n")
		.assert()
		.success()
		.stdout("one two\n\n1. a\n2. b\n");

	Ok(())
}

#[test]
fn malformed_env_option_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.args(["-e", "wrap", "-"])
		.write_stdin("text\n")
		.assert()
		.code(2)
		.stdout("")
		.stderr(predicates::str::contains("-e option"));

	Ok(())
}

#[test]
fn invalid_option_value_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdfmt_cmd()
		.current_dir(tmp.path())
		.args(["-e", "wrap=sometimes", "-"])
		.write_stdin("text\n")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("wrap"));

	Ok(())
}
