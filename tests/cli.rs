//! Integration tests driving the `cell` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;

fn run_cell(args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cell"))
        .args(args)
        .env_remove("CELL_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start cell");

    // The child may exit without reading stdin; a broken pipe is fine then.
    let mut pipe = child.stdin.take().expect("stdin is piped");
    let _ = pipe.write_all(stdin.as_bytes());
    drop(pipe);
    let output = child.wait_with_output().expect("Failed to wait for cell");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn test_basic_program() {
    let (stdout, stderr, code) = run_cell(&["puts(5 + 3, \"ok\")"], "");
    assert_eq!(stdout, "8 ok\n");
    assert_eq!(stderr, "");
    assert_eq!(code, 0);
}

#[test]
fn test_version_flag() {
    let (stdout, _, code) = run_cell(&["-V"], "");
    assert_eq!(stdout, format!("Cell {}\n", env!("CARGO_PKG_VERSION")));
    assert_eq!(code, 0);
}

#[test]
fn test_record_loop_over_stdin() {
    let (stdout, _, code) = run_cell(&["-n", "puts(NR, NF, $2)"], "a b c\n\nx y\n");
    assert_eq!(stdout, "1 3 b\n2 1 \n3 2 y\n");
    assert_eq!(code, 0);
}

#[test]
fn test_field_separator_flag() {
    let (stdout, _, code) = run_cell(&["-n", "-F", ",", "s += $2; puts(s)"], "a,1\nb,2\n");
    assert_eq!(stdout, "1\n3\n");
    assert_eq!(code, 0);
}

#[test]
fn test_input_files_are_concatenated() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("one.txt");
    let second = dir.path().join("two.txt");
    std::fs::write(&first, "alpha\n").unwrap();
    std::fs::write(&second, "beta\n").unwrap();

    let (stdout, _, code) = run_cell(
        &["-n", "puts(NR . \":\" . $0)", path_arg(&first), path_arg(&second)],
        "ignored\n",
    );
    assert_eq!(stdout, "1:alpha\n2:beta\n");
    assert_eq!(code, 0);
}

#[test]
fn test_program_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("prog.cell");
    std::fs::write(
        &script,
        "function fib(n) {\n  if (n < 2) return n\n  return fib(n - 1) + fib(n - 2)\n}\nputs(fib(10))\n",
    )
    .unwrap();

    let (stdout, _, code) = run_cell(&["-f", path_arg(&script)], "");
    assert_eq!(stdout, "55\n");
    assert_eq!(code, 0);
}

#[test]
fn test_exit_code_is_propagated() {
    let (stdout, _, code) = run_cell(&["puts(\"before\"); exit(3); puts(\"after\")"], "");
    assert_eq!(stdout, "before\n");
    assert_eq!(code, 3);
}

#[test]
fn test_fatal_error_exits_one() {
    let (stdout, stderr, code) = run_cell(&["puts(1); nosuch(2)"], "");
    assert_eq!(stdout, "1\n");
    assert!(stderr.starts_with("ERROR: "), "stderr was {stderr:?}");
    assert_eq!(code, 1);
}

#[test]
fn test_deep_recursion() {
    let (stdout, stderr, code) = run_cell(
        &["function depth(n){ if (n == 0) return 0; return depth(n - 1) + 1 }\nputs(depth(3000))"],
        "",
    );
    assert_eq!(stdout, "3000\n");
    assert_eq!(stderr, "");
    assert_eq!(code, 0);
}

#[test]
fn test_runaway_recursion_is_fatal() {
    let (_, stderr, code) = run_cell(&["function forever(n){ return forever(n + 1) }\nforever(0)"], "");
    assert!(stderr.starts_with("ERROR: call depth exceeded"), "stderr was {stderr:?}");
    assert_eq!(code, 1);
}

#[test]
fn test_abort_stops_immediately() {
    let (stdout, _, code) = run_cell(&["puts(\"a\"); abort(2) || puts(\"b\")"], "");
    assert_eq!(stdout, "a\n");
    assert_eq!(code, 2);
}

#[test]
fn test_missing_program() {
    let (_, stderr, code) = run_cell(&[], "");
    assert!(stderr.starts_with("ERROR: "));
    assert_eq!(code, 1);
}

#[test]
fn test_workbook_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("book.grd");

    let (_, _, code) = run_cell(
        &[
            "-S",
            "Data",
            "--to",
            path_arg(&book),
            "[\"A1\"] = 7; [\"B1\"] = \"seven\"",
        ],
        "",
    );
    assert_eq!(code, 0);
    assert!(book.exists());

    let (stdout, _, code) = run_cell(
        &[
            "--from",
            path_arg(&book),
            "@ = \"Data\"; puts(count(), [\"A1\"] * 2, [\"B1\"])",
        ],
        "",
    );
    assert_eq!(stdout, "2 14 seven\n");
    assert_eq!(code, 0);
}

#[test]
fn test_abort_skips_write_back() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("out.csv");

    let (_, _, code) = run_cell(&["--to", path_arg(&book), "[\"A1\"] = 1; abort(4)"], "");
    assert_eq!(code, 4);
    assert!(!book.exists());
}

#[test]
fn test_row_loop_over_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    std::fs::write(&input, "name,qty\nbolt,3\nnut,10\n").unwrap();

    let (_, _, code) = run_cell(
        &[
            "-N",
            "-s",
            "2",
            "--from",
            path_arg(&input),
            "--to",
            path_arg(&output),
            "[\"C\" . NER] = [\"B\" . NER] + 1",
        ],
        "",
    );
    assert_eq!(code, 0);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "name,qty,\nbolt,3,4\nnut,10,11\n"
    );
}
