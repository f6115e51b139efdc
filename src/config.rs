use std::path::PathBuf;
use std::time::Duration;

use crate::process_path;
use crate::Result;

/// Where the executable registered by `install` comes from.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ExecutableSource {
    /// The executable of the running process.
    #[default]
    CurrentProcess,
    /// The executable of another running process, looked up by name.
    NamedProcess(String),
    /// A fixed path.
    Path(PathBuf),
}

impl ExecutableSource {
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            ExecutableSource::CurrentProcess => process_path::current_executable_path(),
            ExecutableSource::NamedProcess(name) => process_path::named_process_path(name),
            ExecutableSource::Path(path) => Ok(path.clone()),
        }
    }
}

/// Settings for a [`Dispatcher`](crate::Dispatcher), fixed for its lifetime.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    pub(crate) additional_usage: Vec<String>,
    pub(crate) executable: ExecutableSource,
    pub(crate) settle_delay: Duration,
}

impl DispatcherConfig {
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1_000);

    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Extra lines appended to the usage listing.
    pub fn additional_usage(&self) -> &[String] {
        &self.additional_usage
    }

    pub fn executable(&self) -> &ExecutableSource {
        &self.executable
    }

    /// Pause between a start or stop and the status query that confirms it.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Builder::new().build()
    }
}

#[derive(Clone, Debug)]
pub struct Builder {
    additional_usage: Vec<String>,
    executable: ExecutableSource,
    settle_delay: Duration,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            additional_usage: vec![],
            executable: ExecutableSource::CurrentProcess,
            settle_delay: DispatcherConfig::DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_additional_usage(mut self, line: impl Into<String>) -> Self {
        self.additional_usage.push(line.into());
        self
    }

    pub fn with_additional_usages<T: Into<String>>(
        mut self,
        lines: impl IntoIterator<Item = T>,
    ) -> Self {
        self.additional_usage
            .extend(lines.into_iter().map(|l| l.into()));
        self
    }

    pub fn with_executable(mut self, executable: ExecutableSource) -> Self {
        self.executable = executable;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn build(self) -> DispatcherConfig {
        DispatcherConfig {
            additional_usage: self.additional_usage,
            executable: self.executable,
            settle_delay: self.settle_delay,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}
