//! Per data type and per channel packet statistics.
use std::collections::BTreeMap;

use crate::datatype::DataType;
use crate::header::PacketHeader;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub name: String,
    pub count: u64,
    /// Total packet bytes
    pub bytes: u64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    /// Data type of the first packet seen on this channel.
    pub data_type: DataType,
    pub count: u64,
    pub bytes: u64,
    /// Packets missing according to sequence number gaps.
    pub missing: u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_sequence: Option<u8>,
}

/// Accumulated statistics for a set of packet headers.
///
/// # Example
/// ```
/// use ch10::{DataType, PacketHeader, Summary};
///
/// let mut summary = Summary::default();
/// let mut header = PacketHeader::new(3, DataType::ANALOG, 100);
/// summary.add(&header);
/// header.sequence_number = 3;
/// summary.add(&header);
///
/// assert_eq!(summary.count, 2);
/// assert_eq!(summary.channels[&3].missing, 2);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub count: u64,
    pub bytes: u64,
    pub missing: u64,
    pub data_types: BTreeMap<DataType, TypeSummary>,
    pub channels: BTreeMap<u16, ChannelSummary>,
}

impl Summary {
    /// Summarize all headers produced by `headers`.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a PacketHeader>,
    {
        let mut summary = Summary::default();
        for header in headers {
            summary.add(header);
        }
        summary
    }

    pub fn add(&mut self, header: &PacketHeader) {
        let bytes = u64::from(header.packet_len);
        self.count += 1;
        self.bytes += bytes;

        let dt = self
            .data_types
            .entry(header.data_type)
            .or_insert_with(|| TypeSummary {
                name: header.data_type.name().to_string(),
                ..Default::default()
            });
        dt.count += 1;
        dt.bytes += bytes;

        let chan = self
            .channels
            .entry(header.channel_id)
            .or_insert_with(|| ChannelSummary {
                data_type: header.data_type,
                ..Default::default()
            });
        chan.count += 1;
        chan.bytes += bytes;
        if let Some(last) = chan.last_sequence {
            // sequence numbers wrap at 255
            let missing = u64::from(header.sequence_number.wrapping_sub(last).wrapping_sub(1));
            chan.missing += missing;
            self.missing += missing;
        }
        chan.last_sequence = Some(header.sequence_number);
    }
}
