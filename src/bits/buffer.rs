//! Packed bit sequence type.

/// Tests bit `index` of `byte`, where index 0 is the most significant bit.
#[inline]
pub fn test_bit(byte: u8, index: usize) -> bool {
    debug_assert!(index < 8);
    (byte >> (7 - index)) & 1 == 1
}

/// Tests bit `index` of a byte slice viewed as one dense bit sequence.
#[inline]
pub fn bit_at(bytes: &[u8], index: usize) -> bool {
    test_bit(bytes[index / 8], index % 8)
}

/// An ordered sequence of bits packed MSB-first into bytes.
///
/// The length does not have to be a multiple of eight. Unused bits of the
/// final byte are always zero, so byte-wise popcounts stay exact.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl BitBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Wraps whole bytes; the buffer holds `8 * data.len()` bits.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let len = data.len() * 8;
        Self { bytes: data, len }
    }

    /// Collects a bit sequence.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(bits);
        buffer
    }

    /// Appends a single bit.
    pub fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    /// Returns bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        bit_at(&self.bytes, index)
    }

    /// Returns the number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the packed bytes. A trailing partial byte is zero-padded.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer and returns the packed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Iterates over the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| bit_at(&self.bytes, i))
    }

    /// Counts the set bits.
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Counts the set bits in `[start, start + count)`.
    pub fn count_ones_in(&self, start: usize, count: usize) -> usize {
        (start..start + count).filter(|&i| self.bit(i)).count()
    }
}

impl Extend<bool> for BitBuffer {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, bits: I) {
        for bit in bits {
            self.push(bit);
        }
    }
}

impl FromIterator<bool> for BitBuffer {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self::from_bits(iter)
    }
}

impl std::fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitBuffer")
            .field("bits", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}
