use exectest::executable::fallback;
use exectest::{ExecutableTest, MarkerProtocol, MarkerProtocolTest, RunStatus, Status};
use std::thread;

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

// 真实子进程：日志与协议行交错
#[test]
fn test_interleaved_output() {
    let script = r#"
echo "init"
echo 'PROTOCOL: {"result": "fail"}'
echo "running subtest a" >&2
echo 'PROTOCOL: {"subtest": {"a": "fail"}}'
echo 'PROTOCOL: {"subtest": {"b": "pass"}}'
echo 'PROTOCOL: garbage'
echo 'PROTOCOL: {"subtest": {"a": "pass"}}'
echo 'PROTOCOL: {"result": "pass"}'
"#;
    let mut test = MarkerProtocolTest::with_marker_protocol(sh(script)).unwrap();
    assert_eq!(test.run().unwrap(), RunStatus::Completed);

    let record = test.result();
    assert_eq!(record.overall_result, Some(Status::from("pass")));
    assert_eq!(record.subtests().len(), 2);
    assert_eq!(record.subtest("a").unwrap(), "pass");
    assert_eq!(record.subtest("b").unwrap(), "pass");
    assert!(record.raw_output.contains("running subtest a"));

    let diagnostics: Vec<&str> = record.diagnostic_lines("PROTOCOL: ").collect();
    assert_eq!(diagnostics, vec!["init", "running subtest a"]);
}

// 没有协议行时整体结果为空，由调用者兜底
#[test]
fn test_no_protocol_lines_leave_result_absent() {
    let mut test = MarkerProtocolTest::with_marker_protocol(sh("echo hello; exit 2")).unwrap();
    test.run().unwrap();
    assert!(test.result().overall_result.is_none());

    let mut record = test.into_result();
    fallback::apply_exit_fallback(&mut record);
    assert_eq!(record.overall_result, Some(Status::from("fail")));
}

// 自定义前缀与环境变量
#[test]
fn test_custom_sentinel_and_env() {
    let mut test = ExecutableTest::new(
        sh("echo \"RESULT> {\\\"result\\\": \\\"$STATUS\\\"}\""),
        MarkerProtocol::with_sentinel("RESULT> "),
    )
    .unwrap()
    .with_env("STATUS", "dmesg-warn");
    test.run().unwrap();
    assert_eq!(test.result().overall_result, Some(Status::from("dmesg-warn")));
}

// 多个实例在不同线程中互不影响
#[test]
fn test_independent_instances_in_parallel() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let script = format!("echo 'PROTOCOL: {{\"subtest\": {{\"case{i}\": \"pass\"}}}}'");
                let mut test = MarkerProtocolTest::with_marker_protocol(sh(&script)).unwrap();
                test.run().unwrap();
                test.into_result()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let record = handle.join().unwrap();
        assert_eq!(record.subtests().len(), 1);
        assert_eq!(record.subtest(&format!("case{i}")).unwrap(), "pass");
    }
}

// 标准输出最后一行没有换行符时，协议行不会与标准错误拼接
#[test]
fn test_unterminated_protocol_line_before_stderr() {
    let script = r#"printf 'PROTOCOL: {"result": "pass"}'; echo diag >&2"#;
    let mut test = MarkerProtocolTest::with_marker_protocol(sh(script)).unwrap();
    test.run().unwrap();

    let record = test.result();
    assert_eq!(record.overall_result, Some(Status::from("pass")));
    assert_eq!(record.raw_output, "PROTOCOL: {\"result\": \"pass\"}\ndiag\n");
}
