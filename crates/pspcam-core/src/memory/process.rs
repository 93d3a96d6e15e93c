//! Process discovery and attachment via procfs.
//!
//! A [`ProcessHandle`] owns the two streams needed to work on a live
//! process: `/proc/<pid>/mem` (read/write) and `/proc/<pid>/maps`
//! (read-only, re-readable). Both are opened together or not at all.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::fs::FileExt;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::memory::RawMemory;

/// A live process matched against one of the candidate names.
#[derive(Debug, Clone)]
pub struct DiscoveredProcess {
    pub pid: u32,
    /// The candidate name that matched
    pub matched: String,
    pub cmdline: String,
}

/// Resolves candidate process names to a live PID.
///
/// Candidates are tried in order; the first candidate with a matching
/// process wins. Within one candidate, processes are searched in
/// ascending PID order.
pub trait ProcessProvider {
    fn find(&self, candidates: &[String]) -> Option<DiscoveredProcess>;
}

/// [`ProcessProvider`] backed by `/proc/<pid>/cmdline`.
pub struct ProcfsProvider;

impl ProcfsProvider {
    /// List live processes as (pid, cmdline) pairs, ascending by PID.
    ///
    /// The NUL separators of `cmdline` are rendered as spaces so the
    /// whole launch command can be substring-matched. Our own PID is
    /// excluded.
    fn list_processes(&self) -> Vec<(u32, String)> {
        let own_pid = std::process::id();
        let mut processes = Vec::new();

        let Ok(entries) = fs::read_dir("/proc") else {
            return processes;
        };

        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            else {
                continue;
            };
            if pid == own_pid {
                continue;
            }

            let Ok(raw) = fs::read(entry.path().join("cmdline")) else {
                continue;
            };
            if raw.is_empty() {
                // Kernel threads have no command line
                continue;
            }

            let cmdline = String::from_utf8_lossy(&raw)
                .replace('\0', " ")
                .trim_end()
                .to_string();
            processes.push((pid, cmdline));
        }

        processes.sort_by_key(|(pid, _)| *pid);
        processes
    }
}

impl ProcessProvider for ProcfsProvider {
    fn find(&self, candidates: &[String]) -> Option<DiscoveredProcess> {
        let processes = self.list_processes();
        match_candidates(&processes, candidates)
    }
}

/// Ordered-candidate matching over a process list.
pub fn match_candidates(
    processes: &[(u32, String)],
    candidates: &[String],
) -> Option<DiscoveredProcess> {
    for candidate in candidates {
        if let Some((pid, cmdline)) = processes
            .iter()
            .find(|(_, cmdline)| cmdline.contains(candidate.as_str()))
        {
            return Some(DiscoveredProcess {
                pid: *pid,
                matched: candidate.clone(),
                cmdline: cmdline.clone(),
            });
        }
    }
    None
}

/// Open handle onto a target process's memory.
pub struct ProcessHandle {
    pub pid: u32,
    /// The candidate name the process was found under
    pub matched_name: String,
    mem: Option<File>,
    maps: Option<File>,
}

impl ProcessHandle {
    /// Resolve one of the candidate names and open the process.
    ///
    /// Requires permission to modify the target's memory (same owner or
    /// a permissive ptrace scope); no privilege negotiation is done.
    pub fn attach(provider: &dyn ProcessProvider, candidates: &[String]) -> Result<Self> {
        let found = provider
            .find(candidates)
            .ok_or_else(|| Error::ProcessNotFound(candidates.join(", ")))?;

        info!(
            "Found process '{}' (PID {}): {}",
            found.matched, found.pid, found.cmdline
        );
        Self::open(found.pid, found.matched)
    }

    /// Open both streams for a known PID.
    ///
    /// If the maps stream cannot be opened, the mem stream is released
    /// before returning so no partial-open handle exists.
    pub fn open(pid: u32, matched_name: String) -> Result<Self> {
        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .open(format!("/proc/{pid}/mem"))
            .map_err(|source| Error::ProcessOpenFailed { pid, source })?;
        let maps = File::open(format!("/proc/{pid}/maps"))
            .map_err(|source| Error::ProcessOpenFailed { pid, source })?;

        debug!("Opened /proc/{pid}/mem and /proc/{pid}/maps");
        Ok(Self {
            pid,
            matched_name,
            mem: Some(mem),
            maps: Some(maps),
        })
    }

    /// Re-read the full mapping table.
    ///
    /// The table can change between scans (e.g. after the emulator
    /// finishes allocating guest RAM), so it is read from the start
    /// every time.
    pub fn read_maps(&self) -> Result<String> {
        let mut maps: &File = self.maps.as_ref().ok_or(Error::HandleClosed)?;
        maps.seek(SeekFrom::Start(0))?;
        let mut contents = String::new();
        maps.read_to_string(&mut contents)?;
        Ok(contents)
    }

    pub fn is_open(&self) -> bool {
        self.mem.is_some()
    }

    /// Release both streams. Safe to call repeatedly or when never used.
    pub fn close(&mut self) {
        self.mem.take();
        self.maps.take();
    }
}

impl RawMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        let mem = self.mem.as_ref().ok_or(Error::HandleClosed)?;
        let mut buffer = vec![0u8; len];
        // read_exact_at turns any short read into an error
        mem.read_exact_at(&mut buffer, address)
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        Ok(buffer)
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        let mem = self.mem.as_ref().ok_or(Error::HandleClosed)?;
        mem.write_all_at(data, address)
            .map_err(|e| Error::MemoryWriteFailed {
                address,
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procs(entries: &[(u32, &str)]) -> Vec<(u32, String)> {
        entries
            .iter()
            .map(|(pid, cmd)| (*pid, cmd.to_string()))
            .collect()
    }

    fn names(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidate_order_wins_over_pid_order() {
        // ppsspp has the lower PID, but PPSSPPQt is the earlier candidate
        let processes = procs(&[
            (100, "/usr/bin/ppsspp --fullscreen"),
            (200, "/opt/PPSSPPQt"),
        ]);
        let found = match_candidates(&processes, &names(&["PPSSPPQt", "ppsspp"])).unwrap();
        assert_eq!(found.pid, 200);
        assert_eq!(found.matched, "PPSSPPQt");
    }

    #[test]
    fn test_first_pid_wins_within_candidate() {
        let processes = procs(&[(100, "ppsspp one"), (200, "ppsspp two")]);
        let found = match_candidates(&processes, &names(&["ppsspp"])).unwrap();
        assert_eq!(found.pid, 100);
    }

    #[test]
    fn test_no_match_is_none() {
        let processes = procs(&[(100, "bash"), (200, "vim")]);
        assert!(match_candidates(&processes, &names(&["ppsspp"])).is_none());
    }

    #[test]
    fn test_substring_match_against_full_cmdline() {
        let processes = procs(&[(300, "/home/user/emu/PPSSPPSDL --load game.iso")]);
        let found = match_candidates(&processes, &names(&["PPSSPPSDL"])).unwrap();
        assert_eq!(found.cmdline, "/home/user/emu/PPSSPPSDL --load game.iso");
    }

    // Lifecycle tests attach to our own process; /proc/self/mem is
    // always readable and writable by its owner.
    fn open_self() -> ProcessHandle {
        ProcessHandle::open(std::process::id(), "self".to_string()).unwrap()
    }

    #[test]
    fn test_open_self_reads_static_buffer() {
        static MARKER: [u8; 8] = *b"pspcam!!";
        let handle = open_self();

        let bytes = handle.read_bytes(MARKER.as_ptr() as u64, MARKER.len()).unwrap();
        assert_eq!(bytes, MARKER);
    }

    #[test]
    fn test_read_maps_rereads_from_start() {
        let handle = open_self();

        let first = handle.read_maps().unwrap();
        let second = handle.read_maps().unwrap();

        assert!(!first.is_empty());
        assert_eq!(first.lines().next(), second.lines().next());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut handle = open_self();
        assert!(handle.is_open());

        handle.close();
        assert!(!handle.is_open());
        handle.close();
        assert!(!handle.is_open());
    }

    #[test]
    fn test_operations_after_close_fail_with_handle_closed() {
        static MARKER: [u8; 4] = *b"live";
        let mut handle = open_self();
        let address = MARKER.as_ptr() as u64;
        handle.close();

        assert!(matches!(
            handle.read_bytes(address, MARKER.len()),
            Err(Error::HandleClosed)
        ));
        assert!(matches!(
            handle.write_bytes(address, b"dead"),
            Err(Error::HandleClosed)
        ));
        assert!(matches!(handle.read_maps(), Err(Error::HandleClosed)));
    }
}
