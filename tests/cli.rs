use assert_cmd::Command;
use predicates::prelude::*;

const VAPOR: &str = "$2a$04$TI13sbmh3IHnmRepeEFoJOkVZWsn5S1O8QOwm8ZU5gNIpJog9pXZm";

fn bin() -> Command {
    Command::cargo_bin("bcrypt-rust").unwrap()
}

#[test]
fn hash_from_stdin() {
    bin()
        .args(["hash", "--stdin", "--cost", "4"])
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\$2b\$04\$[./A-Za-z0-9]{53}\n$").unwrap());
}

#[test]
fn cost_and_revision_from_env() {
    bin()
        .args(["hash", "--stdin"])
        .env("BCRYPT_COST", "5")
        .env("BCRYPT_REVISION", "2y")
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$2y$05$"));
}

#[test]
fn rejects_invalid_cost() {
    bin()
        .args(["hash", "--stdin", "--cost", "3"])
        .write_stdin("hunter2\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid cost 3"));
}

#[test]
fn verify_match_and_mismatch() {
    bin()
        .args(["verify", VAPOR, "--stdin"])
        .write_stdin("vapor\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("success"));

    bin()
        .args(["verify", VAPOR, "--stdin"])
        .write_stdin("nope\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn verify_rejects_garbage_hash() {
    bin()
        .args(["verify", "foo", "--stdin"])
        .write_stdin("vapor\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid bcrypt hash"));
}

#[test]
fn salt_command() {
    bin()
        .args(["salt", "--cost", "10"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\$2b\$10\$[./A-Za-z0-9]{22}\n$").unwrap());
}
