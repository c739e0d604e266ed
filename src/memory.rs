use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Access granularity of a data load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessWidth {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl AccessWidth {
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// Bit mask covering the low `bytes()` bytes of a register value.
    pub const fn mask(self) -> u32 {
        match self {
            AccessWidth::Byte => 0xFF,
            AccessWidth::Half => 0xFFFF,
            AccessWidth::Word => 0xFFFF_FFFF,
        }
    }
}

pub trait Bus {
    fn read_u8(&mut self, addr: u32) -> Result<u8>;
    fn read_u16(&mut self, addr: u32) -> Result<u16>;
    fn read_u32(&mut self, addr: u32) -> Result<u32>;
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()>;
    fn write_u16(&mut self, addr: u32, val: u16) -> Result<()>;
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()>;

    /// Raw (zero-extended) read of `width` bytes.
    fn read(&mut self, addr: u32, width: AccessWidth) -> Result<u32> {
        match width {
            AccessWidth::Byte => self.read_u8(addr).map(u32::from),
            AccessWidth::Half => self.read_u16(addr).map(u32::from),
            AccessWidth::Word => self.read_u32(addr),
        }
    }

    /// Writes the low `width` bytes of `val`.
    fn write(&mut self, addr: u32, width: AccessWidth, val: u32) -> Result<()> {
        match width {
            AccessWidth::Byte => self.write_u8(addr, val as u8),
            AccessWidth::Half => self.write_u16(addr, val as u16),
            AccessWidth::Word => self.write_u32(addr, val),
        }
    }
}

/// Flat little-endian RAM mapped at `[base, base + mem.len())`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LinearMemory {
    pub mem: Vec<u8>,
    pub base: u32,
}

impl LinearMemory {
    pub fn new(size: usize) -> Self {
        Self {
            mem: vec![0; size],
            base: 0,
        }
    }

    pub fn with_base(size: usize, base: u32) -> Self {
        Self {
            mem: vec![0; size],
            base,
        }
    }

    /// Copies an image into memory starting at `addr`.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        let off = self.offset(addr, bytes.len())?;
        self.mem[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.offset(addr, 1).is_ok()
    }

    fn offset(&self, addr: u32, len: usize) -> Result<usize> {
        let off = addr.wrapping_sub(self.base) as usize;
        match off.checked_add(len) {
            Some(end) if addr >= self.base && end <= self.mem.len() => Ok(off),
            _ => bail!(
                "address {addr:#010x} (+{len}) outside memory [{:#010x}, {:#010x})",
                self.base,
                self.base as u64 + self.mem.len() as u64
            ),
        }
    }

    fn load_le<const N: usize>(&self, addr: u32) -> Result<[u8; N]> {
        let off = self.offset(addr, N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.mem[off..off + N]);
        Ok(buf)
    }

    fn store_le<const N: usize>(&mut self, addr: u32, bytes: [u8; N]) -> Result<()> {
        let off = self.offset(addr, N)?;
        self.mem[off..off + N].copy_from_slice(&bytes);
        Ok(())
    }
}

impl Bus for LinearMemory {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        Ok(self.load_le::<1>(addr)?[0])
    }
    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        Ok(u16::from_le_bytes(self.load_le(addr)?))
    }
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        Ok(u32::from_le_bytes(self.load_le(addr)?))
    }
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()> {
        self.store_le(addr, [val])
    }
    fn write_u16(&mut self, addr: u32, val: u16) -> Result<()> {
        self.store_le(addr, val.to_le_bytes())
    }
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()> {
        self.store_le(addr, val.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_mapped_bounds() {
        let mut mem = LinearMemory::with_base(8, 0x1000);
        mem.write_u32(0x1004, 0xDEAD_BEEF).unwrap();
        assert_eq!(mem.read_u32(0x1004).unwrap(), 0xDEAD_BEEF);
        assert_eq!(mem.read(0x1004, AccessWidth::Byte).unwrap(), 0xEF);
        assert_eq!(mem.read(0x1006, AccessWidth::Half).unwrap(), 0xDEAD);
        // straddles the end
        assert!(mem.read_u32(0x1006).is_err());
        // below base
        assert!(mem.read_u8(0x0FFF).is_err());
        assert!(!mem.contains(0x1008));
    }

    #[test]
    fn width_write_truncates() {
        let mut mem = LinearMemory::new(4);
        mem.write(0, AccessWidth::Half, 0x1234_5678).unwrap();
        assert_eq!(mem.read_u32(0).unwrap(), 0x0000_5678);
        mem.write(3, AccessWidth::Byte, 0xAB).unwrap();
        assert_eq!(mem.read_u32(0).unwrap(), 0xAB00_5678);
    }
}
