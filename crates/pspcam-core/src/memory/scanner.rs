//! Guest RAM discovery.
//!
//! # Heuristic
//!
//! The emulator gives no symbol or marker for the guest RAM arena, so
//! the scanner substitutes a narrow size window plus a cheap content
//! probe:
//!
//! 1. keep regions of at least 1 MiB;
//! 2. keep regions within 10% of the known 32 MiB PSP user RAM size;
//! 3. read the first 4 bytes of each survivor and reject regions whose
//!    probe is all zero, or whose first or second byte is zero (loaded
//!    guest RAM starts with non-trivial header bytes);
//! 4. accept the first survivor in mapping-table order and stop.
//!
//! "First match wins" is load-bearing: changing it to a best-match
//! search can select a different physical region as guest RAM.

use tracing::{debug, info};

use crate::error::Result;
use crate::memory::layout::guest::{MIN_REGION_SIZE, SIZE_TOLERANCE, TARGET_RAM_SIZE};
use crate::memory::maps::{MemoryRegion, parse_maps};
use crate::memory::process::ProcessHandle;
use crate::memory::RawMemory;

/// Run one discovery pass against a live process.
///
/// Returns `Ok(None)` when no region survives the heuristic — typically
/// the emulator is running but no game is loaded yet. The caller decides
/// whether to re-invoke; the scanner never retries on its own. Only a
/// failure to read the mapping table itself is an `Err`.
pub fn discover(process: &ProcessHandle) -> Result<Option<u64>> {
    let maps = process.read_maps()?;
    let regions = parse_maps(&maps);
    debug!("Scanning {} mapped regions", regions.len());
    Ok(scan_regions(&regions, process))
}

/// Apply the heuristic to an already-parsed region list.
pub fn scan_regions<M: RawMemory>(regions: &[MemoryRegion], mem: &M) -> Option<u64> {
    for region in regions {
        if region.size < MIN_REGION_SIZE {
            continue;
        }

        let deviation =
            (region.size as f64 - TARGET_RAM_SIZE as f64).abs() / TARGET_RAM_SIZE as f64;
        if deviation > SIZE_TOLERANCE {
            continue;
        }

        debug!(
            "Candidate region {:#x} (size {:#x}, perms {})",
            region.start, region.size, region.perms
        );

        let Ok(probe) = mem.read_bytes(region.start, 4) else {
            // Unreadable region, e.g. mapped but not committed
            continue;
        };
        if probe.iter().all(|&b| b == 0) {
            continue;
        }
        if probe[0] == 0 || probe[1] == 0 {
            continue;
        }

        info!(
            "Guest RAM at {:#x} (size {:#x}), first bytes {:02x} {:02x} {:02x} {:02x}",
            region.start, region.size, probe[0], probe[1], probe[2], probe[3]
        );
        return Some(region.start);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mock::MockMemoryBuilder;

    const MIB: u64 = 1024 * 1024;

    fn region(start: u64, size: u64) -> MemoryRegion {
        MemoryRegion {
            start,
            size,
            perms: "rw-p".to_string(),
            path: String::new(),
        }
    }

    #[test]
    fn test_selects_valid_region_among_decoys() {
        let regions = vec![
            region(0x1000, 64 * 1024),        // too small
            region(0x10_0000, 32 * MIB),      // all-zero probe
            region(0x400_0000, 32 * MIB),     // second byte zero
            region(0x800_0000, 32 * MIB),     // valid
            region(0xC00_0000, 32 * MIB),     // valid but later
        ];
        let mem = MockMemoryBuilder::new()
            .bytes_at(0x10_0000, &[0, 0, 0, 0])
            .bytes_at(0x400_0000, &[0x27, 0x00, 0x10, 0x08])
            .bytes_at(0x800_0000, &[0x27, 0x40, 0x10, 0x08])
            .bytes_at(0xC00_0000, &[0x41, 0x42, 0x43, 0x44])
            .build();

        assert_eq!(scan_regions(&regions, &mem), Some(0x800_0000));
    }

    #[test]
    fn test_size_window_excludes_large_regions() {
        // 40 MiB is outside the 10% window around 32 MiB
        let regions = vec![region(0x1000_0000, 40 * MIB)];
        let mem = MockMemoryBuilder::new()
            .bytes_at(0x1000_0000, &[1, 2, 3, 4])
            .build();
        assert_eq!(scan_regions(&regions, &mem), None);
    }

    #[test]
    fn test_size_window_tolerates_ten_percent() {
        let size = 32 * MIB + 32 * MIB / 10;
        let regions = vec![region(0x2000_0000, size)];
        let mem = MockMemoryBuilder::new()
            .bytes_at(0x2000_0000, &[1, 2, 3, 4])
            .build();
        assert_eq!(scan_regions(&regions, &mem), Some(0x2000_0000));
    }

    #[test]
    fn test_unreadable_candidate_is_skipped() {
        let regions = vec![region(0x3000_0000, 32 * MIB), region(0x5000_0000, 32 * MIB)];
        // Only the second candidate is mapped in the mock
        let mem = MockMemoryBuilder::new()
            .bytes_at(0x5000_0000, &[9, 9, 9, 9])
            .build();
        assert_eq!(scan_regions(&regions, &mem), Some(0x5000_0000));
    }

    #[test]
    fn test_first_match_wins() {
        let regions = vec![region(0x100_0000, 32 * MIB), region(0x900_0000, 32 * MIB)];
        let mem = MockMemoryBuilder::new()
            .bytes_at(0x100_0000, &[1, 1, 1, 1])
            .bytes_at(0x900_0000, &[2, 2, 2, 2])
            .build();
        assert_eq!(scan_regions(&regions, &mem), Some(0x100_0000));
    }

    #[test]
    fn test_empty_table() {
        let mem = MockMemoryBuilder::new().build();
        assert_eq!(scan_regions(&[], &mem), None);
    }
}
