// Path: crates/pvm/src/memory.rs
//! Paged address space (spec §4.6 "Memory model"): zones of `Z_Z = 65536`
//! bytes, pages of `Z_P = 4096`, with a fixed layout for the read-only,
//! heap, input, and stack sections.

use jam_types::error::{PageAccessKind, PvmError, ViolationInfo};
use std::collections::BTreeMap;

/// Zone size in bytes.
pub const ZONE_SIZE: u32 = 65_536;
/// Page size in bytes.
pub const PAGE_SIZE: u32 = 4_096;
/// Input section size in bytes (`Z_I`).
pub const INPUT_ZONE_SIZE: u32 = 1 << 24;

fn div_ceil_u32(n: u32, d: u32) -> u32 {
    n / d + u32::from(n % d != 0)
}

/// Per-page access control (spec §4.6: "ReadOnly, ReadWrite").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    ReadOnly,
    ReadWrite,
}

struct Page {
    access: PageAccess,
    data: [u8; PAGE_SIZE as usize],
}

/// The fixed-layout address space a PVM program executes against.
pub struct Memory {
    pages: BTreeMap<u32, Page>,
    ro_base: u32,
    heap_base: u32,
    heap_brk: u32,
    input_base: u32,
    stack_top: u32,
}

impl Memory {
    /// Lays out the address space per spec §4.6's fixed layout, given the
    /// length of the read-only section in bytes. `ro`, `rw` (initial heap
    /// contents), `input`, and an initial stack image are copied into their
    /// respective sections; the heap's break pointer starts immediately
    /// after `rw`, growable via `sbrk`.
    pub fn new(ro: &[u8], rw: &[u8], input: &[u8], stack: &[u8]) -> Self {
        let ro_base = ZONE_SIZE;
        let ro_zones = div_ceil_u32(ro.len() as u32, ZONE_SIZE).max(1);
        let heap_base = 2 * ZONE_SIZE + ro_zones * ZONE_SIZE;
        let input_base = u32::MAX - INPUT_ZONE_SIZE - ZONE_SIZE + 1;
        let stack_top = u32::MAX - 2 * ZONE_SIZE - INPUT_ZONE_SIZE + 1;

        let mut memory = Self {
            pages: BTreeMap::new(),
            ro_base,
            heap_base,
            heap_brk: heap_base + rw.len() as u32,
            input_base,
            stack_top,
        };

        memory.blit(ro_base, ro, PageAccess::ReadOnly);
        memory.blit(heap_base, rw, PageAccess::ReadWrite);
        memory.blit(input_base, input, PageAccess::ReadOnly);
        let stack_base = stack_top.saturating_sub(stack.len() as u32);
        memory.blit(stack_base, stack, PageAccess::ReadWrite);

        memory
    }

    fn page_of(address: u32) -> u32 {
        address / PAGE_SIZE
    }

    fn blit(&mut self, base: u32, data: &[u8], access: PageAccess) {
        for (offset, chunk) in data.chunks(PAGE_SIZE as usize).enumerate() {
            let page_addr = base + offset as u32 * PAGE_SIZE;
            let page_no = Self::page_of(page_addr);
            let page = self.pages.entry(page_no).or_insert_with(|| Page {
                access,
                data: [0u8; PAGE_SIZE as usize],
            });
            page.access = access;
            let start = (page_addr % PAGE_SIZE) as usize;
            let end = (start + chunk.len()).min(PAGE_SIZE as usize);
            if let (Some(slot), Some(source)) =
                (page.data.get_mut(start..end), chunk.get(..end - start))
            {
                slot.copy_from_slice(source);
            }
        }
    }

    /// Grows the heap by `increment` bytes, marking the newly mapped pages
    /// read-write, and returns the previous break (spec §4.6 `sbrk`).
    pub fn sbrk(&mut self, increment: u32) -> u32 {
        let prev = self.heap_brk;
        let new_brk = self.heap_brk.saturating_add(increment);
        let first_new_page = Self::page_of(self.heap_brk.max(self.heap_base));
        let last_new_page = Self::page_of(new_brk.saturating_sub(1).max(self.heap_base));
        for page_no in first_new_page..=last_new_page {
            self.pages.entry(page_no).or_insert_with(|| Page {
                access: PageAccess::ReadWrite,
                data: [0u8; PAGE_SIZE as usize],
            });
        }
        self.heap_brk = new_brk;
        prev
    }

    fn check_access(
        &self,
        address: u32,
        size: u32,
        kind: PageAccessKind,
    ) -> Result<(), PvmError> {
        let page_no = Self::page_of(address);
        let last_page_no = Self::page_of(address.saturating_add(size.saturating_sub(1)));
        for pg in page_no..=last_page_no {
            let page_start = pg * PAGE_SIZE;
            let page = self.pages.get(&pg).ok_or(PvmError::PageFault(ViolationInfo {
                access: kind,
                address: page_start,
                size,
                page: pg,
            }))?;
            if matches!(kind, PageAccessKind::Write) && page.access == PageAccess::ReadOnly {
                return Err(PvmError::PageFault(ViolationInfo {
                    access: kind,
                    address: page_start,
                    size,
                    page: pg,
                }));
            }
        }
        Ok(())
    }

    /// Reads `len` bytes starting at `address`.
    pub fn read(&self, address: u32, len: u32) -> Result<Vec<u8>, PvmError> {
        self.check_access(address, len, PageAccessKind::Read)?;
        let mut out = Vec::with_capacity(len as usize);
        for offset in 0..len {
            let addr = address + offset;
            let pg = Self::page_of(addr);
            let page = self
                .pages
                .get(&pg)
                .ok_or(PvmError::PageFault(ViolationInfo {
                    access: PageAccessKind::Read,
                    address: pg * PAGE_SIZE,
                    size: len,
                    page: pg,
                }))?;
            let byte = page
                .data
                .get((addr % PAGE_SIZE) as usize)
                .copied()
                .unwrap_or(0);
            out.push(byte);
        }
        Ok(out)
    }

    /// Writes `value` starting at `address`.
    pub fn write(&mut self, address: u32, value: &[u8]) -> Result<(), PvmError> {
        self.check_access(address, value.len() as u32, PageAccessKind::Write)?;
        for (offset, &byte) in value.iter().enumerate() {
            let addr = address + offset as u32;
            let page_no = Self::page_of(addr);
            if let Some(page) = self.pages.get_mut(&page_no) {
                if let Some(slot) = page.data.get_mut((addr % PAGE_SIZE) as usize) {
                    *slot = byte;
                }
            }
        }
        Ok(())
    }

    pub fn ro_base(&self) -> u32 {
        self.ro_base
    }

    pub fn heap_base(&self) -> u32 {
        self.heap_base
    }

    pub fn input_base(&self) -> u32 {
        self.input_base
    }

    pub fn stack_top(&self) -> u32 {
        self.stack_top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_read_only_section() {
        let mem = Memory::new(b"hello", &[], &[], &[]);
        assert_eq!(mem.read(mem.ro_base(), 5).unwrap(), b"hello");
    }

    #[test]
    fn write_to_read_only_page_faults() {
        let mut mem = Memory::new(b"hello", &[], &[], &[]);
        let err = mem.write(mem.ro_base(), b"x").unwrap_err();
        assert!(matches!(err, PvmError::PageFault(_)));
    }

    #[test]
    fn write_then_read_roundtrips_in_heap() {
        let mut mem = Memory::new(&[], &[0u8; 16], &[], &[]);
        mem.write(mem.heap_base(), b"data").unwrap();
        assert_eq!(mem.read(mem.heap_base(), 4).unwrap(), b"data");
    }

    #[test]
    fn unmapped_access_page_faults() {
        let mem = Memory::new(&[], &[], &[], &[]);
        let err = mem.read(mem.heap_base() + ZONE_SIZE * 4, 1).unwrap_err();
        assert!(matches!(err, PvmError::PageFault(_)));
    }

    #[test]
    fn cross_page_read_faults_with_next_page_start_address() {
        let mut mem = Memory::new(&[], &[0u8; PAGE_SIZE as usize], &[], &[]);
        // sbrk maps only the second page; leave a gap so the read below
        // crosses from a mapped first page into an unmapped second page.
        let second_page_addr = mem.heap_base() + PAGE_SIZE;
        let straddling_addr = second_page_addr - 4;
        let err = mem.read(straddling_addr, 8).unwrap_err();
        match err {
            PvmError::PageFault(info) => {
                assert_eq!(info.address, second_page_addr);
                assert_eq!(info.size, 8);
                assert_eq!(info.page, Memory::page_of(second_page_addr));
            }
            other => panic!("expected PageFault, got {other:?}"),
        }
    }

    #[test]
    fn sbrk_grows_heap_and_returns_previous_break() {
        let mut mem = Memory::new(&[], &[0u8; 4], &[], &[]);
        let prev = mem.sbrk(PAGE_SIZE * 2);
        assert_eq!(prev, mem.heap_base() + 4);
        mem.write(prev, b"ok").unwrap();
        assert_eq!(mem.read(prev, 2).unwrap(), b"ok");
    }
}
