use std::collections::HashSet;
use std::io::{Read, Seek};
use std::iter::FusedIterator;

use tracing::debug;

use crate::header::PacketHeader;
use crate::prelude::*;
use crate::stream::PacketStream;

/// Iterator over the headers of a [PacketStream], optionally restricted to a set of
/// channels.
///
/// Iteration starts at the stream cursor and ends at end of file. Any other error is
/// yielded once and iteration stops, leaving the cursor at the offending offset.
///
/// The stream stays usable while iterating, e.g., [PacketHeaders::read_data] reads the
/// data of the header just yielded.
pub struct PacketHeaders<'a, R> {
    stream: &'a mut PacketStream<R>,
    channels: HashSet<u16>,
    done: bool,
}

impl<'a, R> PacketHeaders<'a, R>
where
    R: Read + Seek,
{
    pub(crate) fn new<I>(stream: &'a mut PacketStream<R>, channels: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        PacketHeaders {
            stream,
            channels: channels.into_iter().collect(),
            done: false,
        }
    }

    /// Read the data of the most recently yielded header.
    ///
    /// # Errors
    /// See [PacketStream::read_data].
    pub fn read_data(&mut self) -> Result<&[u8]> {
        self.stream.read_data()
    }

    /// Offset of the most recently yielded header.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.stream.header_offset()
    }

    /// The underlying stream.
    pub fn stream(&mut self) -> &mut PacketStream<R> {
        self.stream
    }

    fn wanted(&self, header: &PacketHeader) -> bool {
        self.channels.is_empty() || self.channels.contains(&header.channel_id)
    }
}

impl<R> Iterator for PacketHeaders<'_, R>
where
    R: Read + Seek,
{
    type Item = Result<PacketHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.stream.read_next_header() {
                Ok(header) => {
                    let header = *header;
                    if self.wanted(&header) {
                        return Some(Ok(header));
                    }
                }
                Err(Error::EndOfFile) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    debug!(%err, "header iteration stopped");
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<R> FusedIterator for PacketHeaders<'_, R> where R: Read + Seek {}

/// Iterate over the headers in `stream` whose channel id is in `channels`, or all headers
/// if `channels` is empty.
pub fn iterate<R, I>(stream: &mut PacketStream<R>, channels: I) -> PacketHeaders<'_, R>
where
    R: Read + Seek,
    I: IntoIterator<Item = u16>,
{
    PacketHeaders::new(stream, channels)
}
