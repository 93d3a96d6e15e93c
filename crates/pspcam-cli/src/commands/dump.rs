//! Dump command implementation.

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Local;
use pspcam_core::layout::guest::TARGET_RAM_SIZE;
use pspcam_core::{Config, GuestMemory, ProcessHandle, ProcfsProvider, ScanReport, scanner};

pub fn run(
    config: &Config,
    output: Option<PathBuf>,
    offset: u64,
    size: Option<u64>,
    report: Option<PathBuf>,
) -> Result<()> {
    let process = ProcessHandle::attach(&ProcfsProvider, &config.process_names)?;
    println!("Found process '{}' (PID {})", process.matched_name, process.pid);

    if let Some(report_path) = &report {
        let scan_report = ScanReport::collect(&process)?;
        scan_report.save(report_path)?;
        println!("Scan report saved to: {}", report_path.display());
    }

    let Some(base) = scanner::discover(&process)? else {
        if report.is_some() {
            // The report alone is still useful for triaging the miss
            return Ok(());
        }
        bail!("Could not find guest RAM. Make sure a game is loaded in PPSSPP");
    };
    println!("Guest memory base: {base:#x}");

    let guest = GuestMemory::with_base(&process, base);
    let len = size.unwrap_or(TARGET_RAM_SIZE - offset.min(TARGET_RAM_SIZE));
    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "pspcam-dump-{}.bin",
            Local::now().format("%Y%m%d-%H%M%S")
        ))
    });

    pspcam_core::dump_region(&guest, offset, len, &path)?;
    println!(
        "Dumped {len:#x} bytes at guest offset {offset:#x} to: {}",
        path.display()
    );

    Ok(())
}
