//! Locating the executable to register as the service binary.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use sysinfo::System;
use tracing::debug;

use crate::{Error, Result};

/// Path of the executable of the current process.
pub fn current_executable_path() -> Result<PathBuf> {
    env::current_exe().map_err(|e| Error::ExecutablePathUnavailable(e.to_string()))
}

/// Path of the executable of the first running process called `name`.
///
/// `name` may be given with or without the platform's executable extension and is compared
/// case-insensitively.
pub fn named_process_path(name: &str) -> Result<PathBuf> {
    let mut system = System::new();
    system.refresh_all();

    let process = system
        .processes()
        .values()
        .find(|process| matches_process_name(process.name(), name))
        .ok_or_else(|| Error::ExecutablePathUnavailable(format!("no process named {name}")))?;

    let path = process.exe().ok_or_else(|| {
        Error::ExecutablePathUnavailable(format!(
            "executable of process {name} ({}) is not accessible",
            process.pid()
        ))
    })?;
    debug!(process = name, path = %path.display(), "Resolved process executable");
    Ok(path.to_path_buf())
}

fn matches_process_name(process_name: &OsStr, wanted: &str) -> bool {
    let process_name = process_name.to_string_lossy();
    if process_name.eq_ignore_ascii_case(wanted) {
        return true;
    }
    Path::new(process_name.as_ref())
        .file_stem()
        .map(|stem| stem.to_string_lossy().eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}
