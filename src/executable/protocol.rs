//! 标记协议解释器
//!
//! 子进程在标准输出中写入以哨兵前缀开头的行来上报结果：
//!
//! ```text
//! PROTOCOL: {"result": "pass"}
//! PROTOCOL: {"subtest": {"name": "fail", "other": "pass"}}
//! ```
//!
//! 其余行被视为普通日志。负载解析失败的行会被跳过，不会中断解释。

use anyhow::Result;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::executable::Interpret;
use crate::result::ResultRecord;
use crate::status::Status;

/// 默认的协议行前缀
pub const DEFAULT_SENTINEL: &str = "PROTOCOL: ";

/// 一条协议行携带的更新
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProtocolUpdate {
    #[serde(default)]
    pub result: Option<Status>,
    #[serde(default)]
    pub subtest: Option<BTreeMap<String, Status>>,
}

impl ProtocolUpdate {
    /// 把更新写入结果记录：整体结果直接覆盖，子测试逐个写入
    pub fn apply_to(self, record: &mut ResultRecord) {
        if let Some(result) = self.result {
            record.set_result(result);
        }
        if let Some(subtests) = self.subtest {
            record.merge_subtests(subtests);
        }
    }
}

/// 按行扫描输出、解析哨兵前缀协议的解释器
#[derive(Debug, Clone)]
pub struct MarkerProtocol {
    sentinel: String,
}

impl Default for MarkerProtocol {
    fn default() -> Self {
        Self::with_sentinel(DEFAULT_SENTINEL)
    }
}

impl MarkerProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义前缀，前缀按字节精确匹配
    pub fn with_sentinel(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// 解析单行，非协议行或负载无效时返回 `None`
    pub fn parse_line(&self, line: &str) -> Option<ProtocolUpdate> {
        let payload = line.strip_prefix(self.sentinel.as_str())?;
        match decode_payload(payload) {
            Ok(update) => Some(update),
            Err(e) => {
                debug!("忽略无法解析的协议行 {line:?}: {e}");
                None
            }
        }
    }
}

fn decode_payload(payload: &str) -> serde_json::Result<ProtocolUpdate> {
    let value: Value = serde_json::from_str(payload)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("payload is not a JSON object"));
    }
    serde_json::from_value(value)
}

impl Interpret for MarkerProtocol {
    fn interpret_result(&mut self, result: &mut ResultRecord) -> Result<()> {
        let updates: Vec<ProtocolUpdate> = result
            .raw_output
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect();

        debug!("找到 {} 条协议行", updates.len());
        for update in updates {
            update.apply_to(result);
        }
        Ok(())
    }
}
