//! Typed parser for the `/proc/<pid>/maps` table.

/// One row of the mapping table.
///
/// Immutable once parsed; a fresh set is produced for every scan since
/// the table can change while the target is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub size: u64,
    /// Permission flags as printed by the kernel, e.g. `rw-p`
    pub perms: String,
    /// Backing path; empty for anonymous mappings
    pub path: String,
}

/// Parse the full maps table into regions, preserving table order.
///
/// Rows that do not follow the `start-end perms offset dev inode [path]`
/// shape are skipped rather than treated as errors.
pub fn parse_maps(contents: &str) -> Vec<MemoryRegion> {
    contents.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<MemoryRegion> {
    let mut parts = line.split_whitespace();
    let range = parts.next()?;
    let perms = parts.next()?;

    // offset, dev, inode
    parts.next()?;
    parts.next()?;
    parts.next()?;

    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end < start {
        return None;
    }

    // The path may itself contain spaces (e.g. "/memfd:ppsspp (deleted)")
    let path = parts.collect::<Vec<_>>().join(" ");

    Some(MemoryRegion {
        start,
        size: end - start,
        perms: perms.to_string(),
        path,
    })
}
