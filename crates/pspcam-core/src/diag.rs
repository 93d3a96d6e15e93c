//! Diagnostics for scanner triage: raw memory dumps and a JSON report
//! of the regions the scanner looked at.
//!
//! Not used on the injection path.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::memory::layout::guest::MIN_REGION_SIZE;
use crate::memory::{GuestMemory, ProcessHandle, RawMemory, parse_maps, scanner};

/// One mapped region as the scanner saw it.
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub address: String,
    pub size: u64,
    pub perms: String,
    pub path: String,
    /// Hex rendering of the first bytes, or a note when unreadable
    pub probe: String,
}

/// Snapshot of a discovery pass over a live process.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub pid: u32,
    pub matched_name: String,
    /// Selected guest RAM base, if any
    pub base: Option<String>,
    /// Every region at least 1 MiB large, in mapping-table order
    pub regions: Vec<RegionReport>,
}

impl ScanReport {
    /// Collect a report by re-running the scan and probing each region
    /// large enough to have been considered.
    pub fn collect(process: &ProcessHandle) -> Result<Self> {
        let maps = process.read_maps()?;
        let regions = parse_maps(&maps);
        let base = scanner::scan_regions(&regions, process);

        let regions = regions
            .iter()
            .filter(|r| r.size >= MIN_REGION_SIZE)
            .map(|r| RegionReport {
                address: format!("{:#x}", r.start),
                size: r.size,
                perms: r.perms.clone(),
                path: r.path.clone(),
                probe: probe_hex(process, r.start, 16),
            })
            .collect();

        Ok(Self {
            pid: process.pid,
            matched_name: process.matched_name.clone(),
            base: base.map(|b| format!("{b:#x}")),
            regions,
        })
    }

    /// Save the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn probe_hex<M: RawMemory>(mem: &M, address: u64, len: usize) -> String {
    match mem.read_bytes(address, len) {
        Ok(bytes) => bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => "(read failed)".to_string(),
    }
}

/// Write a byte-for-byte copy of a guest-relative range to a file.
pub fn dump_region<M: RawMemory>(
    guest: &GuestMemory<'_, M>,
    offset: u64,
    len: u64,
    path: &Path,
) -> Result<()> {
    const CHUNK: usize = 64 * 1024;

    let mut file = File::create(path)?;
    let mut done = 0u64;
    while done < len {
        let step = CHUNK.min((len - done) as usize);
        let chunk = guest.read_bytes(offset + done, step)?;
        file.write_all(&chunk)?;
        done += step as u64;
    }
    file.flush()?;
    Ok(())
}
