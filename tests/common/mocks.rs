use async_trait::async_trait;
use cluster_om::{CommandOutput, CommandRunner, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&str, usize) -> CommandOutput + Send + Sync>;

/// Command runner answering from a closure and recording every call.
///
/// The closure receives the command line and how many times that exact
/// command line was seen before.
pub struct MockCommandRunner {
    responder: Responder,
    calls: Mutex<Vec<String>>,
}

impl MockCommandRunner {
    pub fn new(responder: impl Fn(&str, usize) -> CommandOutput + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same output.
    pub fn replying(status: i32, output: &str) -> Self {
        let output = output.to_string();
        Self::new(move |_, _| CommandOutput::new(status, output.clone()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        let seen = {
            let mut calls = self.calls.lock().unwrap();
            let seen = calls.iter().filter(|c| c.as_str() == command).count();
            calls.push(command.to_string());
            seen
        };
        Ok((self.responder)(command, seen))
    }
}

/// Runner standing in for the status query: writes `dump` to the quoted
/// path that ends the command line, then exits with `status`.
pub fn status_dump_runner(dump: &str, status: i32, output: &str) -> MockCommandRunner {
    let dump = dump.to_string();
    let output = output.to_string();
    MockCommandRunner::new(move |command, _| {
        if let Some(path) = command.split_whitespace().last() {
            std::fs::write(path.trim_matches('\''), &dump).unwrap();
        }
        CommandOutput::new(status, output.clone())
    })
}

/// Runner that holds every command for `latency` and remembers how many
/// were in flight at once.
pub struct InFlightRunner {
    inner: MockCommandRunner,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightRunner {
    pub fn new(
        latency: Duration,
        responder: impl Fn(&str, usize) -> CommandOutput + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: MockCommandRunner::new(responder),
            latency,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls()
    }
}

#[async_trait]
impl CommandRunner for InFlightRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let output = self.inner.run(command).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        output
    }
}
