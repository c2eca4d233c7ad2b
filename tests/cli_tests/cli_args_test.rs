use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn run_json(cmd: &mut Command) -> (Value, i32) {
    let output = cmd.output().expect("failed to execute process");
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    (json, output.status.code().unwrap_or(-1))
}

// 测试帮助信息
#[test]
fn test_help_lists_options() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--sentinel"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--no-fallback"));
}

// 没有命令时应报参数错误
#[test]
fn test_missing_command_fails() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.assert().failure().code(2);
}

// 协议行设置整体结果和子测试
#[test]
fn test_protocol_lines_end_up_in_json() {
    let script = r#"echo 'PROTOCOL: {"result": "pass"}'
echo 'working...'
echo 'PROTOCOL: {"subtest": {"test1": "pass"}}'
echo 'PROTOCOL: {"subtest": {"test2": "fail"}}'"#;

    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.args(["-q", "--", "sh", "-c", script]);
    let (json, code) = run_json(&mut cmd);

    assert_eq!(code, 0);
    assert_eq!(json["result"], "pass");
    assert_eq!(json["subtest"]["test1"], "pass");
    assert_eq!(json["subtest"]["test2"], "fail");
    assert_eq!(json["returncode"], 0);
    assert!(json["out"].as_str().unwrap().contains("working..."));
}

// 没有协议行时按退出码兜底
#[test]
fn test_exit_code_fallback() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.args(["-q", "--", "sh", "-c", "echo plain output; exit 4"]);
    let (json, code) = run_json(&mut cmd);

    assert_eq!(code, 1);
    assert_eq!(json["result"], "fail");
    assert_eq!(json["returncode"], 4);
}

// pass 但退出码非零 -> warn
#[test]
fn test_pass_with_nonzero_exit_is_warn() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.args(["-q", "--", "sh", "-c", "echo 'PROTOCOL: {\"result\": \"pass\"}'; exit 1"]);
    let (json, code) = run_json(&mut cmd);

    assert_eq!(code, 0);
    assert_eq!(json["result"], "warn");
}

// --no-fallback 保持结果为空
#[test]
fn test_no_fallback_leaves_result_absent() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.args(["-q", "--no-fallback", "--", "true"]);
    let (json, code) = run_json(&mut cmd);

    assert_eq!(code, 1);
    assert!(json.get("result").is_none());
    assert_eq!(json["subtest"], serde_json::json!({}));
}

// --raw 不解释协议行
#[test]
fn test_raw_mode_ignores_protocol() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.args(["-q", "--raw", "--", "sh", "-c", "echo 'PROTOCOL: {\"result\": \"fail\"}'"]);
    let (json, _) = run_json(&mut cmd);

    assert_eq!(json["result"], "pass");
    assert!(json["out"].as_str().unwrap().starts_with("PROTOCOL: "));
}

// 找不到可执行文件时标记为 skip
#[test]
fn test_missing_executable_is_skipped() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.args(["-q", "--", "exectest-no-such-command-4f1c"]);
    let (json, code) = run_json(&mut cmd);

    assert_eq!(code, 0);
    assert_eq!(json["result"], "skip");
    assert!(json["returncode"].is_null());
}

// 配置文件与输出文件
#[test]
fn test_config_file_and_output_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("exectest.toml");
    let output_path = temp_dir.path().join("result.json");

    let config_content = r#"
sentinel = "PIGLIT: "

[env]
EXECTEST_GREETING = "hello"
"#;
    fs::write(&config_path, config_content).unwrap();

    let mut cmd = Command::cargo_bin("exectest").unwrap();
    cmd.arg("-c")
        .arg(&config_path)
        .arg("-o")
        .arg(&output_path)
        .args([
            "--",
            "sh",
            "-c",
            "echo \"PIGLIT: {\\\"subtest\\\": {\\\"$EXECTEST_GREETING\\\": \\\"pass\\\"}}\"",
        ])
        .env("RUST_LOG", "debug")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let json: Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(json["subtest"]["hello"], "pass");
    assert_eq!(json["result"], "pass");
    assert_eq!(json["environment"], "EXECTEST_GREETING=\"hello\"");
}

// 超时
#[test]
fn test_timeout_reports_timeout() {
    let mut cmd = Command::cargo_bin("exectest").unwrap();
    let script = r#"echo 'PROTOCOL: {"subtest": {"early": "pass"}}'; sleep 10; echo late"#;
    cmd.args(["-q", "--timeout", "1", "--", "sh", "-c", script]);
    let started = std::time::Instant::now();
    let (json, code) = run_json(&mut cmd);

    assert!(started.elapsed() < std::time::Duration::from_secs(8));
    assert_eq!(code, 1);
    assert_eq!(json["result"], "timeout");
    assert_eq!(json["timed_out"], true);
    assert_eq!(json["subtest"]["early"], "pass");
}
