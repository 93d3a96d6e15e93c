//! Typed, guest-relative access to the target's memory.

use memchr::memmem;

use crate::error::{Error, Result};
use crate::memory::layout::guest::POINTER_REBASE;

/// Raw byte-addressable access to a process's memory.
///
/// Implemented by [`ProcessHandle`](crate::memory::ProcessHandle) for
/// live processes and by the test double. A short read or write is an
/// error, never a truncated success.
pub trait RawMemory {
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>>;
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()>;
}

/// Typed accessor over a raw backend plus the discovered guest RAM base.
///
/// All offsets are guest-relative; the host address is `base + offset`.
/// The base is established at most once per session via [`set_base`] and
/// never re-derived behind the caller's back. While it is absent, every
/// operation fails fast with [`Error::BaseNotEstablished`].
///
/// [`set_base`]: GuestMemory::set_base
pub struct GuestMemory<'m, M: RawMemory> {
    mem: &'m M,
    base: Option<u64>,
}

impl<'m, M: RawMemory> GuestMemory<'m, M> {
    pub fn new(mem: &'m M) -> Self {
        Self { mem, base: None }
    }

    pub fn with_base(mem: &'m M, base: u64) -> Self {
        Self {
            mem,
            base: Some(base),
        }
    }

    /// Record the guest RAM base from a successful discovery pass.
    pub fn set_base(&mut self, base: u64) {
        self.base = Some(base);
    }

    pub fn base(&self) -> Option<u64> {
        self.base
    }

    fn host_address(&self, offset: u64) -> Result<u64> {
        let base = self.base.ok_or(Error::BaseNotEstablished)?;
        Ok(base + offset)
    }

    /// Read raw bytes at a guest-relative offset.
    pub fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.mem.read_bytes(self.host_address(offset)?, len)
    }

    fn read_array<const N: usize>(&self, offset: u64) -> Result<[u8; N]> {
        let bytes = self.read_bytes(offset, N)?;
        // read_bytes returned exactly N bytes or errored
        Ok(bytes.try_into().unwrap_or([0u8; N]))
    }

    pub fn read_u16(&self, offset: u64) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>(offset)?))
    }

    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>(offset)?))
    }

    pub fn read_f32(&self, offset: u64) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array::<4>(offset)?))
    }

    pub fn write_u16(&self, offset: u64, value: u16) -> Result<()> {
        self.mem
            .write_bytes(self.host_address(offset)?, &value.to_le_bytes())
    }

    pub fn write_f32(&self, offset: u64, value: f32) -> Result<()> {
        self.mem
            .write_bytes(self.host_address(offset)?, &value.to_le_bytes())
    }

    /// Read a guest pointer and rebase it to a guest-relative offset.
    ///
    /// A raw value of 0 stays 0 (null) instead of being rebased. Non-null
    /// values use u32 wrapping subtraction, matching the guest's 32-bit
    /// pointer arithmetic.
    pub fn read_pointer(&self, offset: u64) -> Result<u64> {
        let raw = self.read_u32(offset)?;
        if raw == 0 {
            return Ok(0);
        }
        Ok(u64::from(raw.wrapping_sub(POINTER_REBASE)))
    }

    /// Bounded forward scan of guest RAM for a byte signature.
    ///
    /// Scans `[0, limit)` in 64 KiB chunks with overlap so matches
    /// across chunk boundaries are found. Stops at the first unreadable
    /// chunk. Returns the guest-relative offset of the first hit.
    pub fn find_signature(&self, needle: &[u8], limit: u64) -> Result<Option<u64>> {
        const CHUNK: usize = 64 * 1024;

        if self.base.is_none() {
            return Err(Error::BaseNotEstablished);
        }
        if needle.is_empty() {
            return Ok(None);
        }

        let finder = memmem::Finder::new(needle);
        let overlap = needle.len() - 1;
        let mut carry: Vec<u8> = Vec::new();
        let mut offset = 0u64;

        while offset < limit {
            let len = CHUNK.min((limit - offset) as usize);
            let Ok(chunk) = self.read_bytes(offset, len) else {
                break;
            };

            let mut window = carry.clone();
            window.extend_from_slice(&chunk);
            if let Some(pos) = finder.find(&window) {
                return Ok(Some(offset - carry.len() as u64 + pos as u64));
            }

            let keep = window.len().saturating_sub(overlap);
            carry = window.split_off(keep);
            offset += len as u64;
        }

        Ok(None)
    }
}
