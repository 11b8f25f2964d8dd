use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn grove(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("grove"));
    cmd.current_dir(dir.path())
        .env_remove("GROVE_AST_DUMP")
        .env_remove("GROVE_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

const CLEAN: &str = "class Greeter {\n  String name\n  String greet() { return name }\n}\n";

#[test]
fn help_mentions_parse() {
    let temp = TempDir::new().unwrap();
    grove(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"));
}

#[test]
fn clean_file_exits_zero() {
    let temp = TempDir::new().unwrap();
    temp.child("Greeter.groovy").write_str(CLEAN).unwrap();

    grove(&temp)
        .args(["parse", "Greeter.groovy"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("summary: 0 errors, 0 warnings"));
}

#[test]
fn syntax_errors_exit_one_with_positions() {
    let temp = TempDir::new().unwrap();
    temp.child("broken.groovy").write_str("def a = 1\nx =\n").unwrap();

    grove(&temp)
        .args(["parse", "broken.groovy"])
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("broken.groovy:2:")
                .and(predicate::str::contains("error[syntax-error]")),
        );
}

#[test]
fn json_output_is_machine_readable() {
    let temp = TempDir::new().unwrap();
    temp.child("broken.groovy").write_str("x =\n").unwrap();

    let output = grove(&temp)
        .args(["parse", "broken.groovy", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["summary"]["errors"].as_u64(), Some(1));
    assert_eq!(v["summary"]["collapsed"].as_u64(), Some(1));
    assert_eq!(v["diagnostics"][0]["code"], "syntax-error");
    assert_eq!(v["diagnostics"][0]["severity"], "error");
    assert_eq!(v["diagnostics"][0]["line"].as_u64(), Some(1));
    assert!(v.get("dump").is_none());
}

#[test]
fn dump_flag_prints_the_tree() {
    let temp = TempDir::new().unwrap();
    temp.child("Greeter.groovy").write_str(CLEAN).unwrap();

    grove(&temp)
        .args(["parse", "Greeter.groovy", "--dump", "tree"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Type Greeter [")
                .and(predicate::str::contains("Method greet [")),
        );
}

#[test]
fn dump_comes_from_config_or_environment() {
    let temp = TempDir::new().unwrap();
    temp.child("Greeter.groovy").write_str(CLEAN).unwrap();
    temp.child("grove.toml")
        .write_str("[logging]\nstderr = false\n\n[converter]\ndump = \"html\"\n")
        .unwrap();

    grove(&temp)
        .args(["parse", "Greeter.groovy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<html><body>"));

    grove(&temp)
        .args(["parse", "Greeter.groovy"])
        .env("GROVE_AST_DUMP", "groovy")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("class Greeter")
                .and(predicate::str::contains("<html>").not()),
        );
}

#[test]
fn explicit_config_sets_the_nesting_limit() {
    let temp = TempDir::new().unwrap();
    let nested = format!("x = {}1{}\n", "(".repeat(12), ")".repeat(12));
    temp.child("deep.groovy").write_str(&nested).unwrap();
    temp.child("conf.toml")
        .write_str("[converter]\nmax_nesting_depth = 8\n")
        .unwrap();

    grove(&temp)
        .args(["parse", "deep.groovy", "--config", "conf.toml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("nesting"));

    grove(&temp)
        .args(["parse", "deep.groovy"])
        .assert()
        .code(0);

    grove(&temp)
        .args(["parse", "deep.groovy", "--max-nesting-depth", "8"])
        .assert()
        .code(1);
}

#[test]
fn missing_files_exit_two() {
    let temp = TempDir::new().unwrap();
    grove(&temp)
        .args(["parse", "absent.groovy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read absent.groovy"));
}

#[test]
fn broken_config_exits_two() {
    let temp = TempDir::new().unwrap();
    temp.child("Greeter.groovy").write_str(CLEAN).unwrap();
    temp.child("grove.toml").write_str("[converter\n").unwrap();

    grove(&temp)
        .args(["parse", "Greeter.groovy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("toml"));
}

#[test]
fn config_warnings_are_logged() {
    let temp = TempDir::new().unwrap();
    temp.child("Greeter.groovy").write_str(CLEAN).unwrap();
    temp.child("grove.toml")
        .write_str("[converter]\ndumpp = \"tree\"\ndump = \"mindmapp\"\n")
        .unwrap();

    grove(&temp)
        .args(["parse", "Greeter.groovy"])
        .assert()
        .code(0)
        .stderr(
            predicate::str::contains("unknown config key `converter.dumpp`")
                .and(predicate::str::contains("`mindmapp` is not a known dump format")),
        );
}
