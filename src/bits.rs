//! MSB-first bit cursors over byte buffers.
//!
//! Mnemonic words, checksums, transformations and carrier payloads are all
//! addressed as bit strings; these two cursors are the only place where bit
//! offsets are turned into byte/shift pairs.

/// Reads up to 32 bits at a time from a byte slice, most significant bit first.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        if self.pos >= self.data.len() * 8 {
            return None;
        }
        let bit = (self.data[self.pos / 8] >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Some(bit == 1)
    }

    /// Returns `None` when fewer than `count` bits are left; the cursor is not
    /// moved in that case.
    pub fn read(&mut self, count: usize) -> Option<u32> {
        debug_assert!(count <= 32);
        if count > self.remaining() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..count {
            let bit = self.read_bit()?;
            value = (value << 1) | bit as u32;
        }
        Some(value)
    }
}

/// Appends bits to a growing byte buffer, most significant bit first.
#[derive(Default)]
pub struct BitWriter {
    data: Vec<u8>,
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 1 << (7 - self.len % 8);
        }
        self.len += 1;
    }

    /// Writes the low `count` bits of `value`.
    pub fn write(&mut self, value: u32, count: usize) {
        debug_assert!(count <= 32);
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write(*byte as u32, 8);
        }
    }

    /// Trailing bits of the last byte are zero-padded.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
