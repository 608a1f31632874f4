//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Use-case tests that must not spawn processes or touch the disk
//! - Asserting on exactly which commands a pipeline issued, in order
//! - Simulating failing, hanging or file-producing external tools

use ledger_ops_ports::{
    BoxFuture, CommandOutput, CommandPort, CommandSpec, CommandStatus, HandoffOutcome,
    HandoffSpec, LogEvent, LogFields, LoggerPort, PermissionChange, ProcessHandoffPort,
    ToolLocatorPort, WorkspacePort,
};
use ledger_ops_shared::{ErrorEnvelope, RequestContext, Result};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event, with child base fields merged in.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().expect("logger lock").clone()
    }

    /// Names of the recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.into_string())
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut fields = self.base_fields.clone();
            fields.extend(event.fields.unwrap_or_default());
            event.fields = Some(fields);
        }
        self.events.lock().expect("logger lock").push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields: merged,
        })
    }
}

type CommandHook = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

#[derive(Clone)]
enum Scripted {
    Output(CommandOutput),
    Hang,
}

/// Command runner that records every spec and replies from a script.
///
/// Commands are keyed by [`CommandSpec::label`]. Unscripted labels succeed.
#[derive(Clone, Default)]
pub struct RecordingCommandRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    scripted: BTreeMap<Box<str>, Scripted>,
    hooks: BTreeMap<Box<str>, CommandHook>,
}

impl RecordingCommandRunner {
    /// Runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `label` exit with `code`.
    #[must_use]
    pub fn with_exit_code(self, label: &str, code: i32) -> Self {
        self.with_output(label, CommandOutput::with_status(CommandStatus::Exited(code)))
    }

    /// Make `label` return `output`.
    #[must_use]
    pub fn with_output(mut self, label: &str, output: CommandOutput) -> Self {
        self.scripted.insert(label.into(), Scripted::Output(output));
        self
    }

    /// Make `label` block until the request is cancelled.
    #[must_use]
    pub fn with_hang(mut self, label: &str) -> Self {
        self.scripted.insert(label.into(), Scripted::Hang);
        self
    }

    /// Run `hook` whenever `label` is invoked, before it replies.
    #[must_use]
    pub fn with_hook(
        mut self,
        label: &str,
        hook: impl Fn(&CommandSpec) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.insert(label.into(), Arc::new(hook));
        self
    }

    /// Every spec received so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("runner lock").clone()
    }

    /// Labels received so far, in order.
    pub fn labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|spec| spec.label.into_string())
            .collect()
    }

    /// Calls carrying `label`.
    pub fn calls_for(&self, label: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.label.as_ref() == label)
            .collect()
    }
}

impl CommandPort for RecordingCommandRunner {
    fn run(&self, ctx: &RequestContext, spec: CommandSpec) -> BoxFuture<'_, Result<CommandOutput>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("recording_runner.run")?;
            self.calls.lock().expect("runner lock").push(spec.clone());
            if let Some(hook) = self.hooks.get(spec.label.as_ref()) {
                hook(&spec);
            }

            match self.scripted.get(spec.label.as_ref()) {
                Some(Scripted::Output(output)) => Ok(output.clone()),
                Some(Scripted::Hang) => {
                    ctx.cancelled().await;
                    Err(ErrorEnvelope::cancelled("command cancelled")
                        .with_metadata("label", spec.label.as_ref()))
                },
                None => Ok(CommandOutput::success()),
            }
        })
    }
}

/// Tool locator over a fixed name-to-path table.
#[derive(Debug, Clone, Default)]
pub struct StaticToolLocator {
    tools: BTreeMap<String, PathBuf>,
}

impl StaticToolLocator {
    /// Locator that knows each name under `/usr/bin`.
    pub fn with_tools<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let tools = names
            .into_iter()
            .map(|name| (name.to_owned(), Path::new("/usr/bin").join(name)))
            .collect();
        Self { tools }
    }
}

impl ToolLocatorPort for StaticToolLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        self.tools.get(tool).cloned()
    }
}

/// File entry held by [`InMemoryWorkspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryFile {
    /// Text contents.
    pub contents: String,
    /// Unix-style permission bits.
    pub mode: u32,
}

const DEFAULT_MODE: u32 = 0o644;

/// Workspace backed by a shared path-to-file map.
///
/// Clones share state, so a command hook can create files the use case then
/// reads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkspace {
    files: Arc<Mutex<BTreeMap<PathBuf, InMemoryFile>>>,
}

impl InMemoryWorkspace {
    /// Empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with the default mode.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.put(path, contents);
        self
    }

    /// Create or replace a file with the default mode.
    pub fn put(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.lock().expect("workspace lock").insert(
            path.into(),
            InMemoryFile {
                contents: contents.into(),
                mode: DEFAULT_MODE,
            },
        );
    }

    /// Contents of `path`, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.entry(path.as_ref()).map(|file| file.contents)
    }

    /// Permission bits of `path`, if present.
    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.entry(path.as_ref()).map(|file| file.mode)
    }

    /// Whether `path` is present.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entry(path.as_ref()).is_some()
    }

    fn entry(&self, path: &Path) -> Option<InMemoryFile> {
        self.files.lock().expect("workspace lock").get(path).cloned()
    }

    fn require(&self, path: &Path) -> Result<InMemoryFile> {
        self.entry(path).ok_or_else(|| not_found(path))
    }
}

fn not_found(path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    ))
    .with_metadata("path", path.to_string_lossy().into_owned())
}

impl WorkspacePort for InMemoryWorkspace {
    fn exists(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move { Ok(self.contains(&path)) })
    }

    fn read_text(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move { self.require(&path).map(|file| file.contents) })
    }

    fn write_text(
        &self,
        _ctx: &RequestContext,
        path: PathBuf,
        contents: String,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut files = self.files.lock().expect("workspace lock");
            let mode = files.get(&path).map_or(DEFAULT_MODE, |file| file.mode);
            files.insert(path, InMemoryFile { contents, mode });
            Ok(())
        })
    }

    fn copy_file(
        &self,
        _ctx: &RequestContext,
        from: PathBuf,
        to: PathBuf,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let source = self.require(&from)?;
            self.files.lock().expect("workspace lock").insert(to, source);
            Ok(())
        })
    }

    fn append_file(
        &self,
        _ctx: &RequestContext,
        from: PathBuf,
        to: PathBuf,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let fragment = self.require(&from)?;
            let mut files = self.files.lock().expect("workspace lock");
            let target = files.get_mut(&to).ok_or_else(|| not_found(&to))?;
            target.contents.push_str(&fragment.contents);
            Ok(())
        })
    }

    fn remove_file(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.files
                .lock()
                .expect("workspace lock")
                .remove(&path)
                .map(|_| ())
                .ok_or_else(|| not_found(&path))
        })
    }

    fn set_permissions(
        &self,
        _ctx: &RequestContext,
        path: PathBuf,
        change: PermissionChange,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut files = self.files.lock().expect("workspace lock");
            let file = files.get_mut(&path).ok_or_else(|| not_found(&path))?;
            file.mode = match change {
                PermissionChange::OwnerReadOnly => 0o400,
                PermissionChange::AddExecutable => file.mode | 0o111,
            };
            Ok(())
        })
    }
}

/// Hand-off double that records the spec and returns instead of exec'ing.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandoff {
    calls: Arc<Mutex<Vec<HandoffSpec>>>,
    exit_code: i32,
}

impl RecordingHandoff {
    /// Hand-off whose successor "exits" with status 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `code` as the successor's exit status.
    #[must_use]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Specs handed off so far.
    pub fn calls(&self) -> Vec<HandoffSpec> {
        self.calls.lock().expect("handoff lock").clone()
    }
}

impl ProcessHandoffPort for RecordingHandoff {
    fn hand_off(
        &self,
        ctx: &RequestContext,
        spec: HandoffSpec,
    ) -> BoxFuture<'_, Result<HandoffOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("recording_handoff.hand_off")?;
            self.calls.lock().expect("handoff lock").push(spec);
            Ok(HandoffOutcome::Exited(self.exit_code))
        })
    }
}
