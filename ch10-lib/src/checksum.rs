//! Word-sum checksums.
//!
//! Chapter 10 headers are protected by a 16-bit sum of their little-endian words. Packet
//! bodies may optionally carry an 8, 16, or 32-bit sum in the packet trailer, as
//! indicated by the low two bits of the packet flags.

/// Sum of all bytes, truncated to 8 bits.
#[must_use]
pub fn sum8(buf: &[u8]) -> u8 {
    buf.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Sum of `buf` as little-endian 16-bit words, truncated to 16 bits.
///
/// An odd trailing byte is zero-extended.
#[must_use]
pub fn sum16(buf: &[u8]) -> u16 {
    buf.chunks(2).fold(0u16, |acc, word| {
        let word = u16::from_le_bytes([word[0], word.get(1).copied().unwrap_or(0)]);
        acc.wrapping_add(word)
    })
}

/// Sum of `buf` as little-endian 32-bit words, truncated to 32 bits.
///
/// A partial trailing word is zero-extended.
#[must_use]
pub fn sum32(buf: &[u8]) -> u32 {
    buf.chunks(4).fold(0u32, |acc, word| {
        let mut bytes = [0u8; 4];
        bytes[..word.len()].copy_from_slice(word);
        acc.wrapping_add(u32::from_le_bytes(bytes))
    })
}

/// Kind of data checksum carried in a packet trailer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    None,
    Sum8,
    Sum16,
    Sum32,
}

impl ChecksumKind {
    /// Determine the kind from the packet flags (bits 1-0).
    #[must_use]
    pub fn from_flags(flags: u8) -> Self {
        match flags & 0x3 {
            0 => ChecksumKind::None,
            1 => ChecksumKind::Sum8,
            2 => ChecksumKind::Sum16,
            _ => ChecksumKind::Sum32,
        }
    }

    /// Number of trailer bytes used by the checksum.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Sum8 => 1,
            ChecksumKind::Sum16 => 2,
            ChecksumKind::Sum32 => 4,
        }
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self == ChecksumKind::None
    }

    /// Compute the checksum of `buf`, widened to 32 bits.
    #[must_use]
    pub fn compute(self, buf: &[u8]) -> u32 {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Sum8 => u32::from(sum8(buf)),
            ChecksumKind::Sum16 => u32::from(sum16(buf)),
            ChecksumKind::Sum32 => sum32(buf),
        }
    }

    /// Decode a stored checksum from the first [ChecksumKind::len] bytes of `trailer`.
    ///
    /// Returns `None` if `trailer` is too short.
    #[must_use]
    pub fn stored(self, trailer: &[u8]) -> Option<u32> {
        let trailer = trailer.get(..self.len())?;
        let mut bytes = [0u8; 4];
        bytes[..trailer.len()].copy_from_slice(trailer);
        Some(u32::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[], 0; "empty")]
    #[test_case(&[0x01, 0x02], 0x0201; "single word")]
    #[test_case(&[0x01, 0x02, 0x03], 0x0204; "odd trailing byte")]
    #[test_case(&[0xff, 0xff, 0x02, 0x00], 0x0001; "wraps")]
    fn sum16_words(dat: &[u8], expected: u16) {
        assert_eq!(sum16(dat), expected);
    }

    #[test]
    fn sum8_wraps() {
        assert_eq!(sum8(&[0xff, 0x02]), 0x01);
    }

    #[test]
    fn sum32_partial_word() {
        assert_eq!(sum32(&[0x01, 0x00, 0x00, 0x00, 0x02]), 0x03);
        assert_eq!(sum32(&[0xff, 0xff, 0xff, 0xff, 0x02]), 0x01);
    }

    #[test_case(0x00, ChecksumKind::None, 0)]
    #[test_case(0x81, ChecksumKind::Sum8, 1)]
    #[test_case(0x02, ChecksumKind::Sum16, 2)]
    #[test_case(0x43, ChecksumKind::Sum32, 4)]
    fn kind_from_flags(flags: u8, kind: ChecksumKind, len: usize) {
        assert_eq!(ChecksumKind::from_flags(flags), kind);
        assert_eq!(kind.len(), len);
    }

    #[test]
    fn stored_checksum() {
        assert_eq!(ChecksumKind::Sum16.stored(&[0x34, 0x12, 0xff]), Some(0x1234));
        assert_eq!(ChecksumKind::Sum32.stored(&[0x34, 0x12]), None);
        assert_eq!(ChecksumKind::None.stored(&[]), Some(0));
    }
}
