//! Named bit ranges over a 64-bit frame image.

/// A contiguous run of bits, `offset` counted from the least significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub offset: u32,
    pub width: u32,
}

impl BitRange {
    pub const fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    /// Range covering `count` hex digits, `digit` counted from the right.
    pub const fn hex_digits(digit: u32, count: u32) -> Self {
        Self::new(digit * 4, count * 4)
    }

    /// A sub-range relative to this range's offset.
    pub const fn sub(self, offset: u32, width: u32) -> Self {
        Self::new(self.offset + offset, width)
    }

    pub const fn mask(self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Extract this range from `image` as an unsigned value.
    pub const fn extract(self, image: u64) -> u64 {
        (image >> self.offset) & self.mask()
    }

    pub const fn is_set(self, image: u64) -> bool {
        self.extract(image) != 0
    }
}
