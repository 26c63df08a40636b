//! Chapter 10 packet headers.
//!
//! Every packet starts with a 24 byte primary header. When bit 7 of the packet flags is
//! set a 12 byte secondary header carrying absolute time immediately follows it. All
//! multi-byte fields are little-endian.
//!
//! ```text
//!  0      2      4          8          12     13     14     15     16          22     24
//!  +------+------+----------+----------+------+------+------+------+-----------+------+
//!  | sync | chid | pkt len  | data len | ver  | seq  | flags| type | ref time  | csum |
//!  +------+------+----------+----------+------+------+------+------+-----------+------+
//!  24           32     34     36
//!  +-------------+------+------+
//!  | time        | rsvd | csum |   (only when flags & 0x80)
//!  +-------------+------+------+
//! ```
use crate::checksum::{sum16, ChecksumKind};
use crate::datatype::DataType;
use crate::prelude::*;

/// Packet sync pattern.
pub const SYNC: u16 = 0xEB25;

/// Header version written by [PacketHeader::new].
pub const DEFAULT_HEADER_VERSION: u8 = 0x06;

/// Format of the time carried in the secondary header (packet flag bits 3-2).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// IRIG 106 Chapter 4 binary weighted time
    Ch4Binary,
    /// IEEE-1588 precision time
    Ieee1588,
    /// 64-bit extended relative time counter
    Ertc,
    Reserved,
}

impl TimeFormat {
    #[must_use]
    pub fn from_flags(flags: u8) -> Self {
        match (flags >> 2) & 0x3 {
            0 => TimeFormat::Ch4Binary,
            1 => TimeFormat::Ieee1588,
            2 => TimeFormat::Ertc,
            _ => TimeFormat::Reserved,
        }
    }
}

/// Optional secondary header.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryHeader {
    /// Absolute time, interpreted according to [TimeFormat].
    pub time: [u32; 2],
    pub reserved: u16,
    pub checksum: u16,
}

impl SecondaryHeader {
    /// Size of a ``SecondaryHeader``
    pub const LEN: usize = 12;
    const CHECKSUM_OFFSET: usize = 10;

    /// Decode and validate from bytes.
    ///
    /// # Errors
    /// [FormatError::NotEnoughData] if `buf` is shorter than [SecondaryHeader::LEN], or
    /// [FormatError::SecondaryChecksum] if the checksum does not match.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::LEN {
            return Err(FormatError::NotEnoughData {
                actual: buf.len(),
                minimum: Self::LEN,
            }
            .into());
        }
        let word = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        let hdr = SecondaryHeader {
            time: [word(0), word(4)],
            reserved: u16::from_le_bytes([buf[8], buf[9]]),
            checksum: u16::from_le_bytes([buf[10], buf[11]]),
        };
        let actual = sum16(&buf[..Self::CHECKSUM_OFFSET]);
        if actual != hdr.checksum {
            return Err(FormatError::SecondaryChecksum {
                expected: hdr.checksum,
                actual,
            }
            .into());
        }
        Ok(hdr)
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..4].copy_from_slice(&self.time[0].to_le_bytes());
        buf[4..8].copy_from_slice(&self.time[1].to_le_bytes());
        buf[8..10].copy_from_slice(&self.reserved.to_le_bytes());
        buf[10..12].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Checksum computed from the time and reserved fields.
    #[must_use]
    pub fn compute_checksum(&self) -> u16 {
        sum16(&self.encode()[..Self::CHECKSUM_OFFSET])
    }

    /// The raw 8 time bytes.
    #[must_use]
    pub fn time_bytes(&self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.encode()[..8]);
        buf
    }
}

/// Chapter 10 packet header.
///
/// The secondary header is only present, and only decoded, when the packet flags say so.
/// See [PacketHeader::has_secondary_header].
///
/// # Example
/// ```
/// use ch10::{DataType, PacketHeader};
///
/// let header = PacketHeader::new(3, DataType::TMATS, 16);
/// let dat = header.encode();
/// assert_eq!(dat.len(), PacketHeader::PRIMARY_LEN);
///
/// let decoded = PacketHeader::decode(&dat).unwrap();
/// assert_eq!(decoded, header);
/// assert_eq!(decoded.data_type.name(), "TMATS");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub sync: u16,
    pub channel_id: u16,
    /// Total packet length, including header, data, filler, and trailer.
    pub packet_len: u32,
    pub data_len: u32,
    pub header_version: u8,
    /// Per-channel counter, wraps at 255.
    pub sequence_number: u8,
    pub flags: u8,
    pub data_type: DataType,
    /// Relative time counter; see [PacketHeader::rtc].
    pub ref_time: [u8; 6],
    pub checksum: u16,
    pub secondary: Option<SecondaryHeader>,
}

impl PacketHeader {
    /// Size of the primary header
    pub const PRIMARY_LEN: usize = 24;
    /// Size of the primary and secondary header together
    pub const MAX_LEN: usize = Self::PRIMARY_LEN + SecondaryHeader::LEN;
    pub const FLAGS_OFFSET: usize = 14;
    pub const CHECKSUM_OFFSET: usize = 22;

    pub const FLAG_SECONDARY_HEADER: u8 = 0x80;
    pub const FLAG_SECONDARY_TIME_SOURCE: u8 = 0x40;
    pub const FLAG_RTC_SYNC_ERROR: u8 = 0x20;
    pub const FLAG_DATA_OVERFLOW: u8 = 0x10;

    /// Create a header with no secondary header and no data checksum.
    ///
    /// The packet length is the header plus `data_len`, padded to a multiple of 4 bytes.
    #[must_use]
    pub fn new(channel_id: u16, data_type: DataType, data_len: u32) -> Self {
        let unpadded = Self::PRIMARY_LEN as u32 + data_len;
        PacketHeader {
            sync: SYNC,
            channel_id,
            packet_len: unpadded.next_multiple_of(4),
            data_len,
            header_version: DEFAULT_HEADER_VERSION,
            sequence_number: 0,
            flags: 0,
            data_type,
            ref_time: [0u8; 6],
            checksum: 0,
            secondary: None,
        }
        .with_checksums()
    }

    /// Decode and validate a header from bytes.
    ///
    /// The secondary header is only decoded if the flags indicate one is present, in
    /// which case `buf` must contain at least [PacketHeader::MAX_LEN] bytes.
    ///
    /// # Errors
    /// [Error::Format] if there are not enough bytes, the sync pattern is wrong, either
    /// checksum does not match, or the packet length cannot contain the header and data.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut hdr = Self::decode_primary(buf)?;
        if hdr.has_secondary_header() {
            if buf.len() < Self::MAX_LEN {
                return Err(FormatError::NotEnoughData {
                    actual: buf.len(),
                    minimum: Self::MAX_LEN,
                }
                .into());
            }
            hdr.secondary = Some(SecondaryHeader::decode(&buf[Self::PRIMARY_LEN..])?);
        }
        hdr.check_lengths()?;
        Ok(hdr)
    }

    fn decode_primary(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::PRIMARY_LEN {
            return Err(FormatError::NotEnoughData {
                actual: buf.len(),
                minimum: Self::PRIMARY_LEN,
            }
            .into());
        }
        let u16_at = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);

        let sync = u16_at(0);
        if sync != SYNC {
            return Err(FormatError::BadSync(sync).into());
        }
        let checksum = u16_at(Self::CHECKSUM_OFFSET);
        let actual = sum16(&buf[..Self::CHECKSUM_OFFSET]);
        if actual != checksum {
            return Err(FormatError::HeaderChecksum {
                expected: checksum,
                actual,
            }
            .into());
        }

        let mut ref_time = [0u8; 6];
        ref_time.copy_from_slice(&buf[16..22]);
        Ok(PacketHeader {
            sync,
            channel_id: u16_at(2),
            packet_len: u32_at(4),
            data_len: u32_at(8),
            header_version: buf[12],
            sequence_number: buf[13],
            flags: buf[Self::FLAGS_OFFSET],
            data_type: DataType(buf[15]),
            ref_time,
            checksum,
            secondary: None,
        })
    }

    fn check_lengths(&self) -> Result<()> {
        let need = self.header_len() as u64 + u64::from(self.data_len);
        if u64::from(self.packet_len) < need {
            return Err(FormatError::Length {
                packet_len: self.packet_len,
                header_len: self.header_len(),
                data_len: self.data_len,
            }
            .into());
        }
        Ok(())
    }

    /// Encode to bytes using the stored field values, including the stored checksums.
    ///
    /// The secondary header is written if one is set. Use [PacketHeader::with_checksums]
    /// after modifying fields to produce a valid header.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header_len());
        buf.extend_from_slice(&self.primary_bytes());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        if let Some(secondary) = &self.secondary {
            buf.extend_from_slice(&secondary.encode());
        }
        buf
    }

    // Primary header bytes covered by the header checksum.
    fn primary_bytes(&self) -> [u8; Self::CHECKSUM_OFFSET] {
        let mut buf = [0u8; Self::CHECKSUM_OFFSET];
        buf[0..2].copy_from_slice(&self.sync.to_le_bytes());
        buf[2..4].copy_from_slice(&self.channel_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.packet_len.to_le_bytes());
        buf[8..12].copy_from_slice(&self.data_len.to_le_bytes());
        buf[12] = self.header_version;
        buf[13] = self.sequence_number;
        buf[14] = self.flags;
        buf[15] = self.data_type.0;
        buf[16..22].copy_from_slice(&self.ref_time);
        buf
    }

    /// Return a copy with the secondary header flag matching the presence of a secondary
    /// header and both checksums recomputed.
    #[must_use]
    pub fn with_checksums(mut self) -> Self {
        if let Some(secondary) = self.secondary.as_mut() {
            self.flags |= Self::FLAG_SECONDARY_HEADER;
            secondary.checksum = secondary.compute_checksum();
        } else {
            self.flags &= !Self::FLAG_SECONDARY_HEADER;
        }
        self.checksum = sum16(&self.primary_bytes());
        self
    }

    #[must_use]
    pub fn has_secondary_header(&self) -> bool {
        self.flags & Self::FLAG_SECONDARY_HEADER != 0
    }

    /// Number of header bytes, 24 or 36 depending on the secondary header.
    #[must_use]
    pub fn header_len(&self) -> usize {
        if self.has_secondary_header() {
            Self::MAX_LEN
        } else {
            Self::PRIMARY_LEN
        }
    }

    /// Number of data bytes following the header(s).
    #[must_use]
    pub fn payload_length(&self) -> u32 {
        self.data_len
    }

    /// Number of bytes following the header(s): data, filler, and trailer.
    #[must_use]
    pub fn body_len(&self) -> usize {
        (self.packet_len as usize).saturating_sub(self.header_len())
    }

    /// True if the intra-packet time source is the secondary header rather than the
    /// relative time counter.
    #[must_use]
    pub fn secondary_time_source(&self) -> bool {
        self.flags & Self::FLAG_SECONDARY_TIME_SOURCE != 0
    }

    #[must_use]
    pub fn rtc_sync_error(&self) -> bool {
        self.flags & Self::FLAG_RTC_SYNC_ERROR != 0
    }

    #[must_use]
    pub fn data_overflow(&self) -> bool {
        self.flags & Self::FLAG_DATA_OVERFLOW != 0
    }

    #[must_use]
    pub fn time_format(&self) -> TimeFormat {
        TimeFormat::from_flags(self.flags)
    }

    #[must_use]
    pub fn data_checksum_kind(&self) -> ChecksumKind {
        ChecksumKind::from_flags(self.flags)
    }

    /// 48-bit relative time counter value (10 MHz ticks).
    #[must_use]
    pub fn rtc(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes[..6].copy_from_slice(&self.ref_time);
        u64::from_le_bytes(bytes)
    }
}
