//! exectest 运行单个外部测试命令，收集其输出，并把输出中以哨兵前缀
//! 标记的协议行解释为整体结果和子测试结果。

pub mod config;
pub mod executable;
pub mod process;
pub mod result;
pub mod status;
pub mod utils;

pub use executable::{
    ExecutableTest, Interpret, MarkerProtocol, MarkerProtocolTest, NoInterpretation, RunStatus,
};
pub use process::{CommandOutput, CommandSpec, ExecError, LocalExecutor, ProcessExecutor};
pub use result::ResultRecord;
pub use status::Status;
