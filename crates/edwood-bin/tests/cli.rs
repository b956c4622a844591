//! End-to-end runs of the built binary in a scratch directory.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn edwood(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_edwood"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn edwood")
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
    String::from_utf8_lossy(&o.stderr).into_owned()
}

#[test]
fn prints_edited_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
    let out = edwood(dir.path(), &["-e", "2d", "a.txt"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "one\nthree\n");
    assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one\ntwo\nthree\n");
}

#[test]
fn in_place_rewrites_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "cat hat\n").unwrap();
    let out = edwood(dir.path(), &["--in-place", "-e", ",x/at/c/og/", "a.txt"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "");
    assert_eq!(fs::read_to_string(&file).unwrap(), "cog hog\n");
}

#[test]
fn out_of_sequence_warnings_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "1\n2\n3\n").unwrap();
    let out = edwood(dir.path(), &["-e", "3d\n1d", "a.txt"]);
    assert!(out.status.success());
    assert_eq!(stderr(&out), "warning: changes out of sequence\n");
    // replayed last-first, the later delete lands past the shortened text
    assert_eq!(stdout(&out), "2\n3\n");
}

#[test]
fn bad_script_fails_and_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "abc\n").unwrap();
    let out = edwood(dir.path(), &["--in-place", "-e", "/zzz/d", "a.txt"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("no match"), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(&file).unwrap(), "abc\n");
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let out = edwood(dir.path(), &["-e", "d", "absent.txt"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("reading absent.txt"));
}

#[test]
fn render_uses_configured_tabstop() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x\ty\n").unwrap();
    fs::write(dir.path().join("edwood.toml"), "[frame]\ntabstop = 2\n").unwrap();
    let out = edwood(dir.path(), &["--render", "8x2", "-e", "0", "a.txt"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "x y\n\n");
}
