//! 基于退出状态的兜底策略
//!
//! 解释步骤之后由调用者执行，按以下顺序决定最终的整体结果：
//! 超时 -> `timeout`；被信号终止 -> `crash`；协议未给出结果时按退出码
//! 取 `pass`/`fail`；协议给出 `pass` 但退出码非零 -> `warn`。

use log::debug;

use crate::result::ResultRecord;
use crate::status::{self, Status};

/// 根据超时标记和退出码修正整体结果
pub fn apply_exit_fallback(record: &mut ResultRecord) {
    let before = record.overall_result.clone();

    if record.timed_out {
        record.set_result(status::TIMEOUT);
    } else if record.returncode.is_some_and(|code| code < 0) {
        record.set_result(status::CRASH);
    } else {
        let reported_pass = record.overall_result.as_ref().map(|r| r == status::PASS);
        match reported_pass {
            None => {
                let token = if record.returncode == Some(0) {
                    status::PASS
                } else {
                    status::FAIL
                };
                record.set_result(token);
            }
            Some(true) if record.returncode != Some(0) => record.set_result(status::WARN),
            Some(_) => {}
        }
    }

    if before != record.overall_result {
        debug!(
            "兜底策略修正结果: {:?} -> {:?} (returncode={:?}, timed_out={})",
            before, record.overall_result, record.returncode, record.timed_out
        );
    }
}

/// 命令未能启动时的结果：`skip`，原因写入输出
pub fn mark_not_launched(record: &mut ResultRecord, reason: &str) {
    record.set_result(status::SKIP);
    if record.raw_output.is_empty() {
        record.raw_output = format!("Test executable could not be launched: {reason}\n");
    }
}

/// 最终状态是否可以视为成功
pub fn is_success(result: Option<&Status>) -> bool {
    result.is_some_and(|r| r == status::PASS || r == status::WARN || r == status::SKIP)
}
