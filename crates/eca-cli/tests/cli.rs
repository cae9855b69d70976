use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap().parent().unwrap().to_path_buf()
}

fn write_source(dir: &tempfile::TempDir, name: &str, src: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, src).unwrap();
    path
}

#[test]
fn assembles_double_demo() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(root.join("demos/double.eca"));
    cmd.assert()
        .success()
        .stdout("0x6015600890600d565b600052005b80019056\n");
}

#[test]
fn assembles_loop_demo() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(root.join("demos/loop.eca"));
    cmd.assert()
        .success()
        .stdout("0x60035b6001900380610002575000\n");
}

#[test]
fn writes_raw_bytes_to_file() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "add.eca", "PUSH1 0x01 ADD\n");
    let out = tmp_dir.path().join("add.bin");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(&src).arg("--raw").arg("-o").arg(&out);
    cmd.assert().success().stdout(predicate::str::is_empty());
    assert_eq!(std::fs::read(&out).unwrap(), vec![0x60, 0x01, 0x01]);
}

#[test]
fn unused_symbols_warn_but_succeed() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "warn.eca", "#spare STOP\nidle(0, 0):\n  STOP\n");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(src);
    cmd.assert()
        .success()
        .stdout("0x5b00\n")
        .stderr(predicate::str::contains("unused vars: 'spare'"))
        .stderr(predicate::str::contains("unused functions: 'idle'"));
}

#[test]
fn parse_error_is_nonzero() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad = write_source(&tmp_dir, "bad.eca", "PUSH0 0x00\n");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(bad);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("Invalid push size"));
}

#[test]
fn lex_error_points_at_literal() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad = write_source(&tmp_dir, "odd.eca", "PUSH2 0x123\n");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(bad);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Lex error"))
        .stderr(predicate::str::contains("line 1, column 7"));
}

#[test]
fn compile_error_is_nonzero() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad = write_source(&tmp_dir, "undef.eca", "PUSH2 @missing\n");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(bad);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("undefined variable 'missing'"));
}

#[test]
fn custom_opcode_table() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "custom.eca", "PUSH1 0x02 FROB\n");
    let mut entries: Vec<String> = vec!["\"FROB\": \"0xef\"".to_string()];
    entries.push("\"JUMP\": 86".to_string());
    entries.push("\"JUMPDEST\": 91".to_string());
    for i in 0..32 {
        entries.push(format!("\"PUSH{}\": {}", i + 1, 0x60 + i));
    }
    for i in 0..16 {
        entries.push(format!("\"SWAP{}\": {}", i + 1, 0x90 + i));
    }
    let table = write_source(&tmp_dir, "ops.json", &format!("{{{}}}", entries.join(", ")));

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(&src).arg("--opcodes").arg(&table);
    cmd.assert().success().stdout("0x6002ef\n");
}

#[test]
fn dump_ast_prints_json() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "ast.eca", "PUSH1 0x01 f()\nf(0, 0):\n  STOP\n");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(src).arg("--dump-ast");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"f\""))
        .stdout(predicate::str::contains("\"in_args\": 0"));
}

#[test]
fn dump_units_lists_offsets() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(root.join("demos/double.eca")).arg("--dump-units");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("call    double() with 1 arg"))
        .stdout(predicate::str::contains("0x000d"))
        .stdout(predicate::str::contains("dest    double()"));
}

#[test]
fn missing_file_is_nonzero() {
    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg("does/not/exist.eca");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn sparse_opcode_table() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "add.eca", "PUSH1 0x01 ADD\n");
    let table = write_source(&tmp_dir, "ops.json", "{\"PUSH1\": \"0x60\", \"ADD\": 1}");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(&src).arg("--opcodes").arg(&table);
    cmd.assert().success().stdout("0x600101\n");
}

#[test]
fn sparse_opcode_table_without_jump_fails_on_call() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "call.eca", "f()\nf(0, 0):\n  ADD\n");
    let table = write_source(&tmp_dir, "ops.json", "{\"PUSH1\": \"0x60\", \"ADD\": 1}");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(&src).arg("--opcodes").arg(&table);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown opcode 'JUMP'"));
}

#[test]
fn repeated_opcode_name_is_rejected() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let src = write_source(&tmp_dir, "add.eca", "PUSH1 0x01 ADD\n");
    let table = write_source(&tmp_dir, "ops.json", "{\"ADD\": 1, \"PUSH1\": 96, \"ADD\": 2}");

    let mut cmd = Command::cargo_bin("eca").unwrap();
    cmd.arg(&src).arg("--opcodes").arg(&table);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid opcode table"));
}
