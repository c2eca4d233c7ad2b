//! 状态标记
//!
//! 子进程通过协议行上报的状态是自由字符串，这里不做封闭枚举，
//! 只提供常用取值的常量。

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PASS: &str = "pass";
pub const FAIL: &str = "fail";
pub const CRASH: &str = "crash";
pub const SKIP: &str = "skip";
pub const WARN: &str = "warn";
pub const DMESG_WARN: &str = "dmesg-warn";
pub const DMESG_FAIL: &str = "dmesg-fail";
pub const TIMEOUT: &str = "timeout";
pub const INCOMPLETE: &str = "incomplete";

/// 单个状态标记（如 `pass`、`fail`），可以是任意字符串
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为协议约定的常见取值之一
    pub fn is_conventional(&self) -> bool {
        matches!(
            self.0.as_str(),
            PASS | FAIL | CRASH | SKIP | WARN | DMESG_WARN | DMESG_FAIL | TIMEOUT | INCOMPLETE
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Status {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Status {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl PartialEq<str> for Status {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Status {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
