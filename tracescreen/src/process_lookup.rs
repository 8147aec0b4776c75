//! Auto-detect process PID from process name, and the command line shown in
//! the screen title.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::Pid;

/// Result of process lookup.
#[derive(Debug)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub command: String,
}

/// Find a process by name.
///
/// Searches `/proc` for processes matching the given name.
/// Matches against the command name from `/proc/<pid>/stat` and, when
/// readable, the executable basename from `/proc/<pid>/exe`. This process
/// is never a candidate.
///
/// # Errors
/// - No processes found
/// - Multiple processes found (ambiguous)
pub fn find_process_by_name(name: &str) -> Result<ProcessInfo> {
    let own_pid = std::process::id();
    let mut matches: Vec<ProcessInfo> = Vec::new();

    let proc_dir = fs::read_dir("/proc").context("Failed to read /proc")?;

    for entry in proc_dir.flatten() {
        let file_name = entry.file_name();
        let pid_str = file_name.to_string_lossy();

        let Ok(raw) = pid_str.parse::<u32>() else {
            continue;
        };
        if raw == own_pid {
            continue;
        }
        let Ok(pid) = Pid::try_from(raw) else {
            continue;
        };

        // Get command name from stat
        let Ok(stat_content) = fs::read_to_string(format!("/proc/{raw}/stat")) else {
            continue;
        };
        let Ok(comm) = extract_comm(&stat_content) else {
            continue;
        };

        // Other users' processes hide their exe link; comm still matches
        let exe_path = fs::read_link(format!("/proc/{raw}/exe")).ok();

        if is_match(&comm, exe_path.as_deref(), name) {
            matches.push(ProcessInfo { pid, command: command_for_pid(pid) });
        }
    }

    match matches.len() {
        0 => bail!(
            "No process matching '{name}' found.\n\
             Check running processes with: ps aux | grep {name}"
        ),
        1 => Ok(matches.remove(0)),
        _ => {
            let list: Vec<String> =
                matches.iter().map(|m| format!("  {} ({})", m.pid.0, m.command)).collect();
            bail!(
                "Multiple processes match '{name}':\n{}\n\n\
                 Specify PID explicitly: tracescreen --pid <PID>",
                list.join("\n")
            )
        }
    }
}

/// Command line of `pid` for display.
///
/// Uses `/proc/<pid>/cmdline`, then the `comm` name for processes without
/// one (kernel threads, zombies), then `"?"`.
#[must_use]
pub fn command_for_pid(pid: Pid) -> String {
    if let Ok(raw) = fs::read(format!("/proc/{}/cmdline", pid.0)) {
        let command = join_cmdline(&raw);
        if !command.is_empty() {
            return command;
        }
    }
    fs::read_to_string(format!("/proc/{}/stat", pid.0))
        .ok()
        .and_then(|stat| extract_comm(&stat).ok())
        .unwrap_or_else(|| "?".to_string())
}

/// `/proc/<pid>/cmdline` is NUL-separated, usually NUL-terminated.
fn join_cmdline(raw: &[u8]) -> String {
    raw.split(|&b| b == 0)
        .filter(|arg| !arg.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract command name from `/proc/<pid>/stat`.
/// Format: "pid (comm) state ..."
fn extract_comm(stat_line: &str) -> Result<String> {
    let open = stat_line.find('(').context("Invalid stat format")?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    if open >= close {
        bail!("Invalid stat format");
    }
    Ok(stat_line[open + 1..close].to_string())
}

/// Check if process matches the search pattern.
fn is_match(comm: &str, exe_path: Option<&Path>, pattern: &str) -> bool {
    let exe_basename =
        exe_path.and_then(Path::file_name).and_then(|n| n.to_str()).unwrap_or_default();

    let pattern_basename = Path::new(pattern).file_name().and_then(|n| n.to_str()).unwrap_or(pattern);

    // Exact match on command or exe basename
    comm == pattern_basename
        || (!exe_basename.is_empty() && exe_basename == pattern_basename)
        // Substring match for flexibility
        || comm.contains(pattern)
        || (!exe_basename.is_empty() && exe_basename.contains(pattern))
}
