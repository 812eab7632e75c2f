use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use mongovisor::errors::{Result, SupervisorError};
use mongovisor::process::{OutputStream, ProcessBackend, ProcessControl};

/// Programs treated as kill helpers rather than as the server.
const HELPER_PROGRAMS: &[&str] = &["kill", "taskkill"];

/// Script for the server process handed out by [`FakeProcessBackend`].
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    /// Lines written to the output stream right after spawn.
    pub lines: Vec<String>,
    /// Keep the output stream open after the scripted lines, until stopped.
    pub keep_output_open: bool,
    /// Ignore `stop()`: `wait()` never resolves.
    pub refuse_to_die: bool,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
}

impl FakeServer {
    /// A server that prints `lines` and then keeps running until stopped.
    pub fn running(lines: Vec<String>) -> Self {
        Self {
            lines,
            keep_output_open: true,
            pid: Some(4242),
            exit_code: Some(0),
            ..Self::default()
        }
    }

    /// A server that prints `lines` and exits on its own.
    pub fn exiting(lines: Vec<String>) -> Self {
        Self {
            lines,
            keep_output_open: false,
            pid: Some(4242),
            exit_code: Some(1),
            ..Self::default()
        }
    }

    pub fn refuse_to_die(mut self) -> Self {
        self.refuse_to_die = true;
        self
    }
}

#[derive(Debug, Default)]
struct Recorded {
    spawned: Vec<Vec<String>>,
    shutdown_ports: Vec<u16>,
    /// Ordered log of everything the backend and its processes saw.
    events: Vec<String>,
}

/// Fake backend that:
/// - hands out a scripted [`FakeProcess`] for the server command
/// - hands out a quiet, immediately exiting process for kill helpers
/// - records spawns, stops and shutdown requests in call order.
#[derive(Debug, Clone)]
pub struct FakeProcessBackend {
    server: FakeServer,
    fail_server_spawn: bool,
    fail_helper_spawn: bool,
    shutdown_delivered: bool,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeProcessBackend {
    pub fn new(server: FakeServer) -> Self {
        Self {
            server,
            fail_server_spawn: false,
            fail_helper_spawn: false,
            shutdown_delivered: true,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    pub fn failing_server_spawn(mut self) -> Self {
        self.fail_server_spawn = true;
        self
    }

    pub fn failing_helper_spawn(mut self) -> Self {
        self.fail_helper_spawn = true;
        self
    }

    /// Result reported by `send_shutdown`.
    pub fn shutdown_delivered(mut self, val: bool) -> Self {
        self.shutdown_delivered = val;
        self
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.recorded.lock().unwrap().spawned.clone()
    }

    /// Spawned commands whose program is a kill helper.
    pub fn helper_spawns(&self) -> Vec<Vec<String>> {
        self.spawned()
            .into_iter()
            .filter(|c| is_helper(c))
            .collect()
    }

    pub fn shutdown_ports(&self) -> Vec<u16> {
        self.recorded.lock().unwrap().shutdown_ports.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.recorded.lock().unwrap().events.clone()
    }

    fn record(&self, event: String) {
        self.recorded.lock().unwrap().events.push(event);
    }
}

fn is_helper(command: &[String]) -> bool {
    command
        .first()
        .is_some_and(|p| HELPER_PROGRAMS.contains(&p.as_str()))
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&self, command: &[String]) -> Result<Box<dyn ProcessControl>> {
        let helper = is_helper(command);
        let label = if helper { "helper" } else { "server" };

        {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.spawned.push(command.to_vec());
            recorded.events.push(format!("spawn:{label}"));
        }

        let fail = if helper {
            self.fail_helper_spawn
        } else {
            self.fail_server_spawn
        };
        if fail {
            self.record(format!("spawn-failed:{label}"));
            return Err(SupervisorError::Spawn {
                command: command.join(" "),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            });
        }

        let script = if helper {
            FakeServer {
                exit_code: Some(0),
                ..FakeServer::default()
            }
        } else {
            self.server.clone()
        };

        Ok(Box::new(FakeProcess::new(
            label,
            script,
            Arc::clone(&self.recorded),
        )))
    }

    fn send_shutdown(&self, port: u16) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.shutdown_ports.push(port);
            recorded.events.push(format!("shutdown:{port}"));
        }
        let delivered = self.shutdown_delivered;
        Box::pin(async move { delivered })
    }
}

/// Scripted process handed out by [`FakeProcessBackend`].
#[derive(Debug)]
pub struct FakeProcess {
    label: &'static str,
    pid: Option<u32>,
    output: Option<OutputStream>,
    /// Holding the sender keeps the output stream open.
    keepalive: Option<mpsc::Sender<String>>,
    refuse_to_die: bool,
    exit_code: Option<i32>,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeProcess {
    fn new(label: &'static str, script: FakeServer, recorded: Arc<Mutex<Recorded>>) -> Self {
        let (tx, output) = OutputStream::channel(script.lines.len() + 1);
        for line in script.lines {
            tx.try_send(line).expect("fake output buffer sized for every line");
        }
        let keepalive = script.keep_output_open.then_some(tx);

        Self {
            label,
            pid: script.pid,
            output: Some(output),
            keepalive,
            refuse_to_die: script.refuse_to_die,
            exit_code: script.exit_code,
            recorded,
        }
    }

    fn record(&self, event: String) {
        self.recorded.lock().unwrap().events.push(event);
    }
}

impl ProcessControl for FakeProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn take_output(&mut self) -> Option<OutputStream> {
        self.output.take()
    }

    fn stop(&mut self) -> Result<()> {
        self.record(format!("stop:{}", self.label));
        if !self.refuse_to_die {
            self.keepalive = None;
        }
        Ok(())
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<i32>>> + Send + '_>> {
        self.record(format!("wait:{}", self.label));
        let refuse = self.refuse_to_die;
        let exit_code = self.exit_code;
        Box::pin(async move {
            if refuse {
                std::future::pending::<()>().await;
            }
            Ok(exit_code)
        })
    }
}
