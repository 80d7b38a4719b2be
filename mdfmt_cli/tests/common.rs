use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn mdfmt_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mdfmt"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("MDFMT_LOG");
	cmd
}
