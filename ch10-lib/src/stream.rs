//! Packet stream navigation.
//!
//! A [PacketStream] owns a seekable source and a cursor, the offset of the next header to
//! read. Headers are read one at a time, forward with [PacketStream::read_next_header]
//! or backward with [PacketStream::read_prev_header]. The data for the current header is
//! read on demand into a buffer owned by the stream that is reused for every packet.
//!
//! Backward steps are answered from a history of packet boundaries seen so far. When the
//! history cannot answer, e.g., after [PacketStream::set_pos], the stream scans backward
//! over at most [StreamOptions::resync_window] bytes for a valid header whose packet ends
//! exactly where the known packet begins.
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use crate::header::{PacketHeader, SYNC};
use crate::iter::PacketHeaders;
use crate::prelude::*;

/// Largest standard packet (512 KiB) plus a full header.
pub const DEFAULT_RESYNC_WINDOW: usize = 524_288 + PacketHeader::MAX_LEN;

/// Mode a stream is opened with.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FileMode {
    Closed = 0,
    /// Open an existing file for reading
    Read = 1,
    /// Create a new file or overwrite an existing file
    Overwrite = 2,
    /// Append data to the end of an existing file
    Append = 3,
    /// Open an existing file for reading in time order
    ReadInOrder = 4,
    /// Open network data stream
    ReadNetworkStream = 5,
}

impl FileMode {
    /// True for the modes that allow reading packets.
    #[must_use]
    pub fn is_read(self) -> bool {
        matches!(
            self,
            FileMode::Read | FileMode::ReadInOrder | FileMode::ReadNetworkStream
        )
    }
}

impl TryFrom<u8> for FileMode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            0 => FileMode::Closed,
            1 => FileMode::Read,
            2 => FileMode::Overwrite,
            3 => FileMode::Append,
            4 => FileMode::ReadInOrder,
            5 => FileMode::ReadNetworkStream,
            _ => return Err(value),
        })
    }
}

/// Options controlling how a [PacketStream] locates packets.
#[derive(TypedBuilder, Debug, Clone)]
pub struct StreamOptions {
    /// Maximum number of bytes to scan backward for a packet boundary when stepping
    /// backward or seeking to the last packet without a known boundary.
    #[builder(default = DEFAULT_RESYNC_WINDOW)]
    pub resync_window: usize,
    /// Remember the boundaries of packets read so backward steps do not need to scan.
    /// Memory use is proportional to the number of distinct packets visited.
    #[builder(default = true)]
    pub track_history: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy)]
struct Current {
    header: PacketHeader,
    offset: u64,
}

/// Chapter 10 packet stream over a seekable source.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use ch10::{DataType, PacketHeader, PacketStream};
///
/// let header = PacketHeader::new(3, DataType::TMATS, 4);
/// let mut dat = header.encode();
/// dat.extend_from_slice(&[1, 2, 3, 4]);
///
/// let mut stream = PacketStream::new(Cursor::new(dat));
/// let header = stream.read_next_header().unwrap();
/// assert_eq!(header.channel_id, 3);
/// assert_eq!(stream.read_data().unwrap(), &[1, 2, 3, 4]);
/// assert!(stream.read_next_header().is_err());
/// ```
pub struct PacketStream<R = File> {
    source: Option<R>,
    mode: FileMode,
    options: StreamOptions,
    cursor: u64,
    current: Option<Current>,
    buffer: Vec<u8>,
    // packet end offset -> packet start offset
    history: BTreeMap<u64, u64>,
}

impl<R> fmt::Debug for PacketStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketStream")
            .field("mode", &self.mode)
            .field("open", &self.source.is_some())
            .field("cursor", &self.cursor)
            .field("header_offset", &self.current.map(|c| c.offset))
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

impl PacketStream<File> {
    /// Open a file using default [StreamOptions].
    ///
    /// # Errors
    /// See [PacketStream::open_with].
    pub fn open<P: AsRef<Path>>(path: P, mode: FileMode) -> Result<Self> {
        Self::open_with(path, mode, StreamOptions::default())
    }

    /// Open a file.
    ///
    /// [FileMode::Read] and [FileMode::ReadInOrder] open an existing file for reading
    /// positioned at the start. [FileMode::Overwrite] creates or truncates the file and
    /// [FileMode::Append] creates or extends it with the cursor at the end.
    ///
    /// # Errors
    /// [Error::NotFound] or [Error::AccessDenied] if the file cannot be opened, and
    /// [Error::Unsupported] for [FileMode::Closed] and [FileMode::ReadNetworkStream].
    pub fn open_with<P: AsRef<Path>>(path: P, mode: FileMode, options: StreamOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = OpenOptions::new();
        match mode {
            FileMode::Read | FileMode::ReadInOrder => {
                opts.read(true);
            }
            FileMode::Overwrite => {
                opts.read(true).write(true).create(true).truncate(true);
            }
            FileMode::Append => {
                opts.read(true).append(true).create(true);
            }
            FileMode::Closed | FileMode::ReadNetworkStream => return Err(Error::Unsupported(mode)),
        }
        let file = opts.open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Error::AccessDenied(path.to_path_buf()),
            _ => Error::Io(err),
        })?;

        let mut stream = Self::with_options(file, options);
        stream.mode = mode;
        if mode == FileMode::Append {
            stream.cursor = stream.stream_len()?;
        }
        debug!(?path, ?mode, cursor = stream.cursor, "opened");
        Ok(stream)
    }
}

impl<R> PacketStream<R>
where
    R: Read + Seek,
{
    /// Create a stream reading from `source` starting at offset 0.
    pub fn new(source: R) -> Self {
        Self::with_options(source, StreamOptions::default())
    }

    pub fn with_options(source: R, options: StreamOptions) -> Self {
        PacketStream {
            source: Some(source),
            mode: FileMode::Read,
            options,
            cursor: 0,
            current: None,
            buffer: Vec::new(),
            history: BTreeMap::new(),
        }
    }

    /// Current mode, [FileMode::Closed] after [PacketStream::close].
    #[must_use]
    pub fn mode(&self) -> FileMode {
        if self.source.is_some() {
            self.mode
        } else {
            FileMode::Closed
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Release the underlying source. Closing an already closed stream is not an error.
    ///
    /// # Errors
    /// Currently infallible; the signature matches the other stream operations.
    pub fn close(&mut self) -> Result<()> {
        if self.source.take().is_some() {
            debug!(cursor = self.cursor, "closed");
        }
        self.current = None;
        self.history.clear();
        self.cursor = 0;
        Ok(())
    }

    /// Consume the stream returning the source, or `None` if it was closed.
    pub fn into_inner(self) -> Option<R> {
        self.source
    }

    /// The most recently read header, if any.
    #[must_use]
    pub fn header(&self) -> Option<&PacketHeader> {
        self.current.as_ref().map(|c| &c.header)
    }

    /// Offset of the most recently read header, if any.
    #[must_use]
    pub fn header_offset(&self) -> Option<u64> {
        self.current.as_ref().map(|c| c.offset)
    }

    /// Contents of the shared buffer as filled by the last data read. Only valid until the
    /// next read.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Allocated size of the shared buffer. It only ever grows.
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn source(&mut self) -> Result<&mut R> {
        self.source.as_mut().ok_or(Error::InvalidHandle)
    }

    fn readable(&mut self) -> Result<&mut R> {
        let mode = self.mode;
        let source = self.source()?;
        if !mode.is_read() {
            return Err(Error::WrongMode(mode));
        }
        Ok(source)
    }

    fn stream_len(&mut self) -> Result<u64> {
        Ok(self.source()?.seek(SeekFrom::End(0))?)
    }

    /// Read and validate the header at `offset` without changing any state.
    fn decode_at(&mut self, offset: u64) -> Result<PacketHeader> {
        let source = self.readable()?;
        source.seek(SeekFrom::Start(offset))?;

        let mut buf = [0u8; PacketHeader::MAX_LEN];
        let num = read_full(source, &mut buf[..PacketHeader::PRIMARY_LEN])?;
        if num == 0 {
            return Err(Error::EndOfFile);
        }
        let mut len = num;
        if num == PacketHeader::PRIMARY_LEN
            && buf[PacketHeader::FLAGS_OFFSET] & PacketHeader::FLAG_SECONDARY_HEADER != 0
        {
            len += read_full(source, &mut buf[PacketHeader::PRIMARY_LEN..])?;
        }
        PacketHeader::decode(&buf[..len]).map_err(|err| err.at(offset))
    }

    fn set_current(&mut self, header: PacketHeader, offset: u64) -> &PacketHeader {
        let end = offset + u64::from(header.packet_len);
        if self.options.track_history {
            self.history.insert(end, offset);
        }
        self.cursor = end;
        trace!(
            offset,
            channel_id = header.channel_id,
            data_type = %header.data_type,
            packet_len = header.packet_len,
            "header"
        );
        &self.current.insert(Current { header, offset }).header
    }

    /// Read the header at the cursor and advance the cursor past its packet.
    ///
    /// # Errors
    /// [Error::EndOfFile] if there are no more bytes. [Error::Format] if the bytes at the
    /// cursor are not a valid header, in which case the cursor is not changed.
    pub fn read_next_header(&mut self) -> Result<&PacketHeader> {
        let offset = self.cursor;
        let header = match self.decode_at(offset) {
            Ok(header) => header,
            Err(err) => {
                if let Error::Format { .. } = err {
                    debug!(offset, %err, "failed to read next header");
                }
                return Err(err);
            }
        };
        Ok(self.set_current(header, offset))
    }

    /// Read the header of the packet preceding the current one.
    ///
    /// If no header has been read since the last reposition the packet preceding the
    /// cursor is read. On success the cursor points just past the packet read, so
    /// [PacketStream::read_next_header] reads the packet that followed it.
    ///
    /// # Errors
    /// [Error::BeginningOfFile] if the current packet is the first one. [Error::Format] if
    /// no packet could be found ending where the current one begins.
    pub fn read_prev_header(&mut self) -> Result<&PacketHeader> {
        self.readable()?;
        let anchor = self.current.as_ref().map_or(self.cursor, |c| c.offset);
        if anchor == 0 {
            return Err(Error::BeginningOfFile);
        }
        let offset = self.find_packet_ending_at(anchor)?;
        let header = self.decode_at(offset)?;
        Ok(self.set_current(header, offset))
    }

    /// Read the data of the current packet into the shared buffer.
    ///
    /// The returned slice is only valid until the next read; the buffer is reused and
    /// grows to fit the largest packet read.
    ///
    /// # Errors
    /// [Error::NoHeader] if there is no current header, or [Error::ShortRead] if the
    /// source ends before all the data declared by the header.
    pub fn read_data(&mut self) -> Result<&[u8]> {
        self.readable()?;
        let Current { header, offset } = self.current.ok_or(Error::NoHeader)?;
        let start = offset + header.header_len() as u64;
        self.fill_buffer(start, header.payload_length() as usize)?;
        Ok(&self.buffer)
    }

    /// Read all bytes of the current packet, including header, filler, and trailer, into
    /// the shared buffer.
    ///
    /// # Errors
    /// Same as [PacketStream::read_data].
    pub fn read_packet(&mut self) -> Result<&[u8]> {
        self.readable()?;
        let Current { header, offset } = self.current.ok_or(Error::NoHeader)?;
        self.fill_buffer(offset, header.packet_len as usize)?;
        Ok(&self.buffer)
    }

    /// Verify the data checksum in the trailer of the current packet.
    ///
    /// Returns `Ok(None)` if the packet does not carry a data checksum. The packet body is
    /// read into the shared buffer.
    ///
    /// # Errors
    /// Same as [PacketStream::read_data], and [Error::Format] if the packet body is too
    /// small to hold the checksum.
    pub fn verify_data_checksum(&mut self) -> Result<Option<bool>> {
        self.readable()?;
        let Current { header, offset } = self.current.ok_or(Error::NoHeader)?;
        let kind = header.data_checksum_kind();
        if kind.is_none() {
            return Ok(None);
        }
        let body_len = header.body_len();
        if body_len < header.data_len as usize + kind.len() {
            return Err(Error::Format {
                offset,
                kind: FormatError::Length {
                    packet_len: header.packet_len,
                    header_len: header.header_len() + kind.len(),
                    data_len: header.data_len,
                },
            });
        }
        self.fill_buffer(offset + header.header_len() as u64, body_len)?;
        let (body, trailer) = self.buffer.split_at(body_len - kind.len());
        let valid = kind.stored(trailer) == Some(kind.compute(body));
        if !valid {
            debug!(offset, ?kind, "data checksum mismatch");
        }
        Ok(Some(valid))
    }

    fn fill_buffer(&mut self, start: u64, len: usize) -> Result<()> {
        let Self { source, buffer, .. } = self;
        let source = source.as_mut().ok_or(Error::InvalidHandle)?;
        // never reserve more than the source holds; lengths come from untrusted headers
        let available = source.seek(SeekFrom::End(0))?.saturating_sub(start);
        source.seek(SeekFrom::Start(start))?;
        buffer.clear();
        buffer.reserve(usize::try_from(available).map_or(len, |avail| avail.min(len)));
        let num = source.by_ref().take(len as u64).read_to_end(buffer)?;
        if num < len {
            debug!(offset = start, expected = len, actual = num, "short read");
            return Err(Error::ShortRead {
                offset: start,
                expected: len,
                actual: num,
            });
        }
        Ok(())
    }

    /// Position the cursor at the first packet.
    ///
    /// # Errors
    /// [Error::InvalidHandle] if the stream is closed.
    pub fn first(&mut self) -> Result<()> {
        self.readable()?;
        self.reposition(0);
        Ok(())
    }

    /// Position the cursor at the start of the last packet.
    ///
    /// The last packet is the one ending exactly at the end of the stream. For truncated
    /// streams it is the last valid header within the resync window.
    ///
    /// # Errors
    /// [Error::EndOfFile] for an empty stream, and [Error::Format] if no valid header is
    /// found within the resync window.
    pub fn last(&mut self) -> Result<()> {
        self.readable()?;
        let len = self.stream_len()?;
        if len == 0 {
            return Err(Error::EndOfFile);
        }
        let offset = match self.history.get(&len).copied() {
            Some(start) => start,
            None => self.scan_for_last(len)?,
        };
        self.reposition(offset);
        Ok(())
    }

    /// Set the cursor. The offset is not validated until the next header read.
    ///
    /// # Errors
    /// [Error::InvalidHandle] if the stream is closed.
    pub fn set_pos(&mut self, offset: u64) -> Result<()> {
        self.source()?;
        self.reposition(offset);
        Ok(())
    }

    /// Current cursor, i.e., the offset of the next header to read.
    ///
    /// # Errors
    /// [Error::InvalidHandle] if the stream is closed.
    pub fn get_pos(&self) -> Result<u64> {
        if self.source.is_none() {
            return Err(Error::InvalidHandle);
        }
        Ok(self.cursor)
    }

    fn reposition(&mut self, offset: u64) {
        self.cursor = offset;
        self.current = None;
    }

    /// Iterate over headers, starting at the cursor, with a channel id in `channels`. An
    /// empty `channels` yields all headers.
    pub fn headers<I>(&mut self, channels: I) -> PacketHeaders<'_, R>
    where
        I: IntoIterator<Item = u16>,
    {
        PacketHeaders::new(self, channels)
    }

    /// Read up to `resync_window` bytes ending at `end`. Returns the window and the offset
    /// of its first byte.
    fn read_window(&mut self, end: u64) -> Result<(u64, Vec<u8>)> {
        let base = end.saturating_sub(self.options.resync_window as u64);
        let source = self.readable()?;
        source.seek(SeekFrom::Start(base))?;
        let mut window = vec![0u8; (end - base) as usize];
        let num = read_full(source, &mut window)?;
        window.truncate(num);
        Ok((base, window))
    }

    fn find_packet_ending_at(&mut self, end: u64) -> Result<u64> {
        if let Some(start) = self.history.get(&end) {
            return Ok(*start);
        }
        debug!(end, window = self.options.resync_window, "scanning backward for packet boundary");
        let (base, window) = self.read_window(end)?;
        let found = headers_backward(&window, base)
            .find(|(start, header)| start + u64::from(header.packet_len) == end)
            .map(|(start, _)| start);
        found.ok_or(Error::Format {
            offset: end,
            kind: FormatError::Resync {
                window: self.options.resync_window,
            },
        })
    }

    fn scan_for_last(&mut self, len: u64) -> Result<u64> {
        debug!(len, window = self.options.resync_window, "scanning backward for last packet");
        let (base, window) = self.read_window(len)?;
        let mut highest = None;
        for (start, header) in headers_backward(&window, base) {
            if start + u64::from(header.packet_len) == len {
                return Ok(start);
            }
            highest.get_or_insert(start);
        }
        match highest {
            Some(start) => {
                debug!(start, "last packet is truncated");
                Ok(start)
            }
            None => Err(Error::Format {
                offset: len,
                kind: FormatError::Resync {
                    window: self.options.resync_window,
                },
            }),
        }
    }
}

/// Valid headers in `window`, nearest the end first, with their absolute offsets.
fn headers_backward(window: &[u8], base: u64) -> impl Iterator<Item = (u64, PacketHeader)> + '_ {
    let sync = SYNC.to_le_bytes();
    (0..window.len().saturating_sub(1))
        .rev()
        .filter(move |idx| window[*idx..].starts_with(&sync))
        .filter_map(move |idx| {
            PacketHeader::decode(&window[idx..])
                .ok()
                .map(|header| (base + idx as u64, header))
        })
}

/// Like `read_exact`, but returns the number of bytes read rather than failing when
/// the reader ends early.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut num = 0;
    while num < buf.len() {
        match reader.read(&mut buf[num..]) {
            Ok(0) => break,
            Ok(n) => num += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(num)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::checksum::sum16;
    use crate::{DataType, Status};

    fn packet(channel_id: u16, data_type: DataType, data: &[u8]) -> Vec<u8> {
        let header = PacketHeader::new(channel_id, data_type, data.len() as u32);
        let mut dat = header.encode();
        dat.extend_from_slice(data);
        dat.resize(header.packet_len as usize, 0);
        dat
    }

    fn recording(channels: &[u16]) -> Vec<u8> {
        channels
            .iter()
            .enumerate()
            .flat_map(|(idx, ch)| packet(*ch, DataType::ANALOG, &vec![idx as u8; idx * 3 + 1]))
            .collect()
    }

    fn stream(dat: Vec<u8>) -> PacketStream<Cursor<Vec<u8>>> {
        PacketStream::new(Cursor::new(dat))
    }

    #[test]
    fn tmats_then_partial_packet() {
        // first packet: 24 byte header + 16 data bytes = 40
        let mut hdr = PacketHeader::new(3, DataType::TMATS, 16);
        hdr.packet_len = 40;
        let mut dat = hdr.with_checksums().encode();
        let payload: Vec<u8> = (0..16).collect();
        dat.extend_from_slice(&payload);
        // 60 bytes of a second packet
        dat.extend(packet(7, DataType::RECORDING_EVENT, &[0xaa; 40]));
        dat.truncate(100);

        let mut stream = stream(dat);
        let header = stream.read_next_header().unwrap();
        assert_eq!(header.channel_id, 3);
        assert_eq!(header.data_type.name(), "TMATS");
        assert_eq!(stream.read_data().unwrap(), &payload[..]);
        assert_eq!(stream.get_pos().unwrap(), 40);

        let header = stream.read_next_header().unwrap();
        assert_eq!(header.channel_id, 7);
        assert_eq!(header.data_type, DataType::RECORDING_EVENT);
        assert_eq!(stream.header_offset(), Some(40));

        // only 36 of the 40 data bytes are present
        let zult = stream.read_data();
        assert!(
            matches!(
                zult,
                Err(Error::ShortRead {
                    offset: 64,
                    expected: 40,
                    actual: 36
                })
            ),
            "{zult:?}"
        );
        assert!(matches!(stream.read_next_header(), Err(Error::EndOfFile)));
    }

    #[test]
    fn corrupt_checksum_leaves_cursor() {
        let mut dat = recording(&[1, 2, 3]);
        let second = packet(1, DataType::ANALOG, &[0]).len();
        dat[second + PacketHeader::CHECKSUM_OFFSET] ^= 0xff;

        let mut stream = stream(dat);
        stream.read_next_header().unwrap();
        let pos = stream.get_pos().unwrap();
        let zult = stream.read_next_header();
        assert!(
            matches!(
                zult,
                Err(Error::Format {
                    kind: FormatError::HeaderChecksum { .. },
                    ..
                })
            ),
            "{zult:?}"
        );
        assert_eq!(stream.get_pos().unwrap(), pos);
        assert_eq!(Status::from_result(&stream.read_next_header()), Status::FormatError);
    }

    #[test]
    fn bad_sync_at_unaligned_offset() {
        let mut stream = stream(recording(&[1, 2]));
        stream.set_pos(2).unwrap();
        let zult = stream.read_next_header();
        assert!(
            matches!(
                zult,
                Err(Error::Format {
                    offset: 2,
                    kind: FormatError::BadSync(_)
                })
            ),
            "{zult:?}"
        );
        assert_eq!(stream.get_pos().unwrap(), 2);
    }

    #[test]
    fn partial_header_is_format_error() {
        let mut dat = recording(&[1]);
        let full = dat.len();
        dat.extend_from_slice(&packet(2, DataType::ANALOG, &[])[..10]);

        let mut stream = stream(dat);
        stream.read_next_header().unwrap();
        let zult = stream.read_next_header();
        assert!(
            matches!(
                zult,
                Err(Error::Format {
                    kind: FormatError::NotEnoughData {
                        actual: 10,
                        minimum: 24
                    },
                    ..
                })
            ),
            "{zult:?}"
        );
        assert_eq!(stream.get_pos().unwrap(), full as u64);
    }

    #[test]
    fn empty_stream() {
        let mut stream = stream(Vec::new());
        assert!(matches!(stream.read_next_header(), Err(Error::EndOfFile)));
        assert!(matches!(stream.read_prev_header(), Err(Error::BeginningOfFile)));
        assert!(matches!(stream.last(), Err(Error::EndOfFile)));
    }

    #[test]
    fn first_matches_fresh_read() {
        let dat = recording(&[4, 5, 6]);
        let expected = *stream(dat.clone()).read_next_header().unwrap();

        let mut stream = stream(dat);
        stream.read_next_header().unwrap();
        stream.read_next_header().unwrap();
        stream.first().unwrap();
        assert_eq!(stream.header(), None);
        assert_eq!(stream.read_next_header().unwrap(), &expected);
    }

    #[test]
    fn set_pos_get_pos() {
        let mut stream = stream(recording(&[1]));
        for pos in [0, 3, 17, 1 << 40] {
            stream.set_pos(pos).unwrap();
            assert_eq!(stream.get_pos().unwrap(), pos);
        }
    }

    #[test]
    fn set_pos_past_end_is_eof() {
        let mut stream = stream(recording(&[1]));
        stream.set_pos(1 << 20).unwrap();
        assert!(matches!(stream.read_next_header(), Err(Error::EndOfFile)));
    }

    #[test]
    fn backward_from_history() {
        let mut stream = stream(recording(&[1, 2, 3, 4]));
        let mut forward = Vec::new();
        while let Ok(header) = stream.read_next_header() {
            forward.push(header.channel_id);
        }
        assert_eq!(forward, vec![1, 2, 3, 4]);

        // current header is still the last one read
        let mut backward = Vec::new();
        while let Ok(header) = stream.read_prev_header() {
            backward.push(header.channel_id);
        }
        assert_eq!(backward, vec![3, 2, 1]);
        assert!(matches!(stream.read_prev_header(), Err(Error::BeginningOfFile)));

        // forward again from the first packet
        assert_eq!(stream.read_next_header().unwrap().channel_id, 2);
    }

    #[test]
    fn backward_by_scanning() {
        let dat = recording(&[1, 2, 3, 4]);
        let offsets: Vec<u64> = {
            let mut stream = stream(dat.clone());
            let mut offsets = Vec::new();
            while stream.read_next_header().is_ok() {
                offsets.push(stream.header_offset().unwrap());
            }
            offsets
        };

        let options = StreamOptions::builder().track_history(false).build();
        let mut stream = PacketStream::with_options(Cursor::new(dat), options);
        stream.set_pos(offsets[3]).unwrap();
        assert_eq!(stream.read_prev_header().unwrap().channel_id, 3);
        assert_eq!(stream.header_offset(), Some(offsets[2]));
        assert_eq!(stream.get_pos().unwrap(), offsets[3]);
        assert_eq!(stream.read_prev_header().unwrap().channel_id, 2);
        assert_eq!(stream.read_prev_header().unwrap().channel_id, 1);
        assert!(matches!(stream.read_prev_header(), Err(Error::BeginningOfFile)));
    }

    #[test]
    fn backward_scan_ignores_sync_in_payload() {
        // payload containing a sync pattern that is not a valid header
        let mut data = vec![0u8; 32];
        data[4..6].copy_from_slice(&SYNC.to_le_bytes());
        let mut dat = packet(1, DataType::ANALOG, &data);
        let second = dat.len() as u64;
        dat.extend(packet(2, DataType::ANALOG, &[1, 2, 3, 4]));

        let options = StreamOptions::builder().track_history(false).build();
        let mut stream = PacketStream::with_options(Cursor::new(dat), options);
        stream.set_pos(second).unwrap();
        let header = stream.read_prev_header().unwrap();
        assert_eq!(header.channel_id, 1);
        assert_eq!(stream.header_offset(), Some(0));
    }

    #[test]
    fn backward_scan_limited_by_window() {
        let mut dat = packet(1, DataType::ANALOG, &[0u8; 256]);
        let second = dat.len() as u64;
        dat.extend(packet(2, DataType::ANALOG, &[1, 2, 3, 4]));

        let options = StreamOptions::builder()
            .track_history(false)
            .resync_window(64)
            .build();
        let mut stream = PacketStream::with_options(Cursor::new(dat), options);
        stream.set_pos(second).unwrap();
        assert!(matches!(
            stream.read_prev_header(),
            Err(Error::Format {
                kind: FormatError::Resync { window: 64 },
                ..
            })
        ));
    }

    #[test]
    fn last_packet() {
        let dat = recording(&[1, 2, 3, 9]);
        let mut stream = stream(dat);
        stream.last().unwrap();
        let pos = stream.get_pos().unwrap();
        let header = *stream.read_next_header().unwrap();
        assert_eq!(header.channel_id, 9);
        assert_eq!(stream.get_pos().unwrap(), pos + u64::from(header.packet_len));
        assert!(matches!(stream.read_next_header(), Err(Error::EndOfFile)));

        // step back from the last packet
        assert_eq!(stream.read_prev_header().unwrap().channel_id, 3);
    }

    #[test]
    fn last_packet_truncated() {
        let mut dat = recording(&[1, 2]);
        let start = dat.len() as u64;
        let mut tail = packet(7, DataType::ANALOG, &[0x55; 64]);
        tail.truncate(40);
        dat.extend(tail);

        let mut stream = stream(dat);
        stream.last().unwrap();
        assert_eq!(stream.get_pos().unwrap(), start);
        assert_eq!(stream.read_next_header().unwrap().channel_id, 7);
        assert!(matches!(stream.read_data(), Err(Error::ShortRead { .. })));
    }

    #[test]
    fn buffer_only_grows() {
        let mut dat = packet(1, DataType::ANALOG, &[1u8; 400]);
        dat.extend(packet(2, DataType::ANALOG, &[2u8; 8]));
        let mut stream = stream(dat);

        stream.read_next_header().unwrap();
        assert_eq!(stream.read_data().unwrap().len(), 400);
        let capacity = stream.buffer_capacity();
        assert!(capacity >= 400);

        stream.read_next_header().unwrap();
        assert_eq!(stream.read_data().unwrap(), &[2u8; 8]);
        assert_eq!(stream.data().len(), 8);
        assert_eq!(stream.buffer_capacity(), capacity);
    }

    #[test]
    fn oversized_data_len_is_short_read() {
        let hdr = PacketHeader::new(1, DataType::ANALOG, 0xFFFF_FF00);
        assert_eq!(hdr.packet_len, 0xFFFF_FF18);
        let mut dat = hdr.encode();
        dat.extend_from_slice(&[0x5a; 16]);

        let mut stream = stream(dat);
        stream.read_next_header().unwrap();
        let zult = stream.read_data();
        assert!(
            matches!(
                zult,
                Err(Error::ShortRead {
                    offset: 24,
                    expected: 0xFFFF_FF00,
                    actual: 16
                })
            ),
            "{zult:?}"
        );
        assert_eq!(stream.data(), &[0x5a; 16]);
        assert!(stream.buffer_capacity() < 4096);

        assert!(matches!(stream.read_packet(), Err(Error::ShortRead { actual: 40, .. })));
        assert!(stream.buffer_capacity() < 4096);
    }

    #[test]
    fn debug_without_debug_source() {
        struct Opaque(Cursor<Vec<u8>>);
        impl Read for Opaque {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0.read(buf)
            }
        }
        impl Seek for Opaque {
            fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
                self.0.seek(pos)
            }
        }

        let mut stream = PacketStream::new(Opaque(Cursor::new(recording(&[1]))));
        stream.read_next_header().unwrap();
        let dbg = format!("{stream:?}");
        assert!(dbg.contains("cursor: 28"), "{dbg}");
        assert!(dbg.contains("header_offset: Some(0)"), "{dbg}");
    }

    #[test]
    fn read_data_needs_header() {
        let mut stream = stream(recording(&[1]));
        assert!(matches!(stream.read_data(), Err(Error::NoHeader)));
        stream.read_next_header().unwrap();
        stream.set_pos(0).unwrap();
        assert!(matches!(stream.read_data(), Err(Error::NoHeader)));
    }

    #[test]
    fn secondary_header_data_offset() {
        let mut hdr = PacketHeader::new(4, DataType::IRIG_TIME, 4);
        hdr.packet_len += 12;
        hdr.secondary = Some(crate::SecondaryHeader {
            time: [1, 2],
            ..Default::default()
        });
        let hdr = hdr.with_checksums();
        let mut dat = hdr.encode();
        dat.extend_from_slice(&[9, 8, 7, 6]);

        let mut stream = stream(dat);
        let header = stream.read_next_header().unwrap();
        assert!(header.has_secondary_header());
        assert_eq!(stream.read_data().unwrap(), &[9, 8, 7, 6]);
        assert_eq!(stream.get_pos().unwrap(), 40);
    }

    #[test]
    fn whole_packet() {
        let dat = packet(2, DataType::ANALOG, &[1, 2, 3]);
        let mut stream = stream(dat.clone());
        stream.read_next_header().unwrap();
        assert_eq!(stream.read_packet().unwrap(), &dat[..]);
    }

    #[test]
    fn data_checksum() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut hdr = PacketHeader::new(2, DataType::ANALOG, data.len() as u32);
        hdr.flags = 0x02; // 16-bit data checksum
        hdr.packet_len += 4; // 2 checksum bytes + 2 filler to stay 4 byte aligned
        let hdr = hdr.with_checksums();
        let mut body = data.to_vec();
        body.extend_from_slice(&[0, 0]);
        let sum = sum16(&body);

        let mut dat = hdr.encode();
        dat.extend_from_slice(&body);
        dat.extend_from_slice(&sum.to_le_bytes());

        let mut stream = stream(dat.clone());
        stream.read_next_header().unwrap();
        assert_eq!(stream.verify_data_checksum().unwrap(), Some(true));
        assert_eq!(stream.read_data().unwrap(), &data);

        let last = dat.len() - 1;
        dat[last] ^= 0x01;
        let mut stream = PacketStream::new(Cursor::new(dat));
        stream.read_next_header().unwrap();
        assert_eq!(stream.verify_data_checksum().unwrap(), Some(false));
    }

    #[test]
    fn no_data_checksum() {
        let mut stream = stream(recording(&[1]));
        stream.read_next_header().unwrap();
        assert_eq!(stream.verify_data_checksum().unwrap(), None);
    }

    #[test]
    fn closed_stream() {
        let mut stream = stream(recording(&[1]));
        assert_eq!(stream.mode(), FileMode::Read);
        stream.close().unwrap();
        stream.close().unwrap();
        assert_eq!(stream.mode(), FileMode::Closed);
        assert!(!stream.is_open());
        assert!(matches!(stream.read_next_header(), Err(Error::InvalidHandle)));
        assert!(matches!(stream.read_prev_header(), Err(Error::InvalidHandle)));
        assert!(matches!(stream.read_data(), Err(Error::InvalidHandle)));
        assert!(matches!(stream.first(), Err(Error::InvalidHandle)));
        assert!(matches!(stream.last(), Err(Error::InvalidHandle)));
        assert!(matches!(stream.set_pos(0), Err(Error::InvalidHandle)));
        assert!(matches!(stream.get_pos(), Err(Error::InvalidHandle)));
        assert!(stream.into_inner().is_none());
    }

    #[test]
    fn file_mode_codes() {
        assert_eq!(FileMode::Closed as u8, 0);
        assert_eq!(FileMode::ReadNetworkStream as u8, 5);
        assert_eq!(FileMode::try_from(3), Ok(FileMode::Append));
        assert_eq!(FileMode::try_from(6), Err(6));
        assert!(FileMode::ReadInOrder.is_read());
        assert!(!FileMode::Overwrite.is_read());
    }
}
