//! 本地进程执行器
//!
//! 直接在本机启动子进程，分别收集标准输出和标准错误。

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::process::{CommandOutput, CommandSpec, ExecError, ProcessExecutor};

/// 轮询子进程状态的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 超时杀掉子进程后，继续读取管道的最长时间
///
/// 子进程派生的后代进程可能仍持有管道，读取不会自然结束。
const DRAIN_GRACE: Duration = Duration::from_millis(500);

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

type Chunk = (Stream, io::Result<Vec<u8>>);

/// 本地执行器
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessExecutor for LocalExecutor {
    fn execute(&mut self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let (program, args) = spec.argv.split_first().ok_or(ExecError::EmptyCommand)?;
        debug!("执行本地命令: {}", spec.command_line());

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let start_time = Instant::now();
        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // 管道必须在等待期间持续读取，否则输出量大的子进程会阻塞在写管道上
        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            spawn_reader(pipe, Stream::Stdout, tx.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            spawn_reader(pipe, Stream::Stderr, tx);
        }

        let (status, timed_out) = match spec.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout)?,
            None => (child.wait()?, false),
        };

        let drain_deadline = timed_out.then(|| Instant::now() + DRAIN_GRACE);
        let (stdout, stderr) = collect_output(rx, drain_deadline)?;
        let elapsed = start_time.elapsed();

        let exit_code = if timed_out {
            warn!("命令执行超时: {}", spec.command_line());
            None
        } else {
            exit_code_of(status)
        };

        debug!("命令执行完成: exit_code={exit_code:?}, 耗时 {elapsed:?}");

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            timed_out,
            elapsed,
        })
    }
}

/// 在后台线程中按块读取管道，每块读到的数据立即发送出去
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<Chunk>) {
    thread::spawn(move || {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((stream, Ok(buf[..n].to_vec()))).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send((stream, Err(e)));
                    break;
                }
            }
        }
    });
}

/// 收集两个管道的输出，直到读取线程全部结束
///
/// 给定 `deadline` 时，到期后停止等待，只保留已经读到的内容。
fn collect_output(
    rx: Receiver<Chunk>,
    deadline: Option<Instant>,
) -> io::Result<(String, String)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    loop {
        let chunk = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(remaining) {
                    Ok(chunk) => chunk,
                    Err(RecvTimeoutError::Timeout) => {
                        debug!("子进程的后代仍持有输出管道，停止读取");
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(chunk) => chunk,
                Err(_) => break,
            },
        };

        let (stream, data) = chunk;
        let data = data?;
        match stream {
            Stream::Stdout => stdout.extend_from_slice(&data),
            Stream::Stderr => stderr.extend_from_slice(&data),
        }
    }

    Ok((
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

/// 等待子进程退出，超过 `timeout` 时杀掉它
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<(ExitStatus, bool)> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            // 进程可能恰好在此刻退出，kill 失败时以 wait 的结果为准
            if let Err(e) = child.kill() {
                debug!("kill 失败: {e}");
            }
            return Ok((child.wait()?, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.code().or_else(|| status.signal().map(|signal| -signal))
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> Option<i32> {
    status.code()
}
