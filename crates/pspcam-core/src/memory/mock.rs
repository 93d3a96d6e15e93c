//! In-memory test double for process memory.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::memory::RawMemory;

/// Fake process memory built from sparse regions, recording every write.
pub struct MockMemory {
    regions: RefCell<BTreeMap<u64, Vec<u8>>>,
    writes: RefCell<Vec<(u64, Vec<u8>)>>,
}

impl MockMemory {
    /// All writes performed so far, in order, as (address, bytes).
    pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    fn locate(&self, address: u64, len: usize) -> Option<(u64, usize)> {
        let regions = self.regions.borrow();
        for (&start, data) in regions.range(..=address).rev().take(1) {
            let offset = (address - start) as usize;
            if offset + len <= data.len() {
                return Some((start, offset));
            }
        }
        None
    }
}

impl RawMemory for MockMemory {
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        let (start, offset) = self.locate(address, len).ok_or(Error::MemoryReadFailed {
            address,
            message: "unmapped".to_string(),
        })?;
        let regions = self.regions.borrow();
        Ok(regions[&start][offset..offset + len].to_vec())
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        let (start, offset) =
            self.locate(address, data.len())
                .ok_or(Error::MemoryWriteFailed {
                    address,
                    message: "unmapped".to_string(),
                })?;
        self.writes.borrow_mut().push((address, data.to_vec()));
        let mut regions = self.regions.borrow_mut();
        let region = regions.get_mut(&start).unwrap();
        region[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Builder for [`MockMemory`].
pub struct MockMemoryBuilder {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    /// Map a zero-filled region.
    pub fn region(mut self, start: u64, size: usize) -> Self {
        self.regions.entry(start).or_insert_with(|| vec![0u8; size]);
        self
    }

    /// Place raw bytes, growing or creating the containing region.
    pub fn bytes_at(mut self, address: u64, bytes: &[u8]) -> Self {
        // Find an existing region that contains the target range
        let containing = self
            .regions
            .range(..=address)
            .next_back()
            .map(|(&start, data)| (start, data.len()))
            .filter(|&(start, len)| address + bytes.len() as u64 <= start + len as u64)
            .map(|(start, _)| start);

        match containing {
            Some(start) => {
                let offset = (address - start) as usize;
                let data = self.regions.get_mut(&start).unwrap();
                data[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            None => {
                self.regions.insert(address, bytes.to_vec());
            }
        }
        self
    }

    pub fn u32_at(self, address: u64, value: u32) -> Self {
        self.bytes_at(address, &value.to_le_bytes())
    }

    pub fn f32_at(self, address: u64, value: f32) -> Self {
        self.bytes_at(address, &value.to_le_bytes())
    }

    pub fn build(self) -> MockMemory {
        MockMemory {
            regions: RefCell::new(self.regions),
            writes: RefCell::new(Vec::new()),
        }
    }
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inside_region() {
        let mem = MockMemoryBuilder::new().bytes_at(0x1000, &[1, 2, 3, 4]).build();
        assert_eq!(mem.read_bytes(0x1001, 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_unmapped_read_fails() {
        let mem = MockMemoryBuilder::new().build();
        assert!(mem.read_bytes(0x1000, 4).is_err());
    }

    #[test]
    fn test_writes_are_recorded_and_applied() {
        let mem = MockMemoryBuilder::new().region(0x2000, 16).build();
        mem.write_bytes(0x2004, &[0xAA, 0xBB]).unwrap();

        assert_eq!(mem.write_count(), 1);
        assert_eq!(mem.writes()[0], (0x2004, vec![0xAA, 0xBB]));
        assert_eq!(mem.read_bytes(0x2004, 2).unwrap(), vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_out_of_bounds_write_fails() {
        let mem = MockMemoryBuilder::new().region(0x2000, 4).build();
        assert!(mem.write_bytes(0x2002, &[0; 4]).is_err());
        assert_eq!(mem.write_count(), 0);
    }
}
