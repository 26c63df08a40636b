//! IRIG 106 Chapter 10 packet stream parsing and navigation.
//!
//! A Chapter 10 recording is a sequence of packets, each a 24 byte primary header, an
//! optional 12 byte secondary header, data, filler, and an optional trailer. This crate
//! decodes and validates headers, navigates forward and backward through a recording,
//! and reads packet data on demand into a reusable buffer.
//!
//! # Example
//! ```
//! use std::io::Cursor;
//! use ch10::{DataType, PacketHeader, PacketStream};
//!
//! let mut dat = Vec::new();
//! for (channel_id, data_type) in [(0, DataType::TMATS), (5, DataType::ANALOG)] {
//!     let header = PacketHeader::new(channel_id, data_type, 4);
//!     dat.extend(header.encode());
//!     dat.extend_from_slice(&[0xaa; 4]);
//! }
//!
//! let mut stream = PacketStream::new(Cursor::new(dat));
//! let mut headers = stream.headers([5]);
//! while let Some(zult) = headers.next() {
//!     let header = zult.unwrap();
//!     assert_eq!(header.data_type.name(), "Analog");
//!     assert_eq!(headers.read_data().unwrap(), &[0xaa; 4]);
//! }
//! ```
mod error;

pub mod checksum;
pub mod datatype;
pub mod header;
pub mod iter;
pub mod stream;
pub mod summary;

#[cfg(feature = "timecode")]
pub mod timecode;

pub use datatype::DataType;
pub use error::{Error, FormatError, Result, Status};
pub use header::{PacketHeader, SecondaryHeader, TimeFormat, SYNC};
pub use iter::{iterate, PacketHeaders};
pub use stream::{FileMode, PacketStream, StreamOptions};
pub use summary::Summary;

pub(crate) mod prelude {
    pub use crate::error::{Error, FormatError, Result};
}
