use std::collections::HashSet;
use std::io::{Read, Seek, Write};

use anyhow::{bail, Context, Result};
use ch10::PacketStream;
use tracing::trace;

/// Write the raw bytes of every packet whose channel is in `include` (or any channel if
/// `include` is empty) and not in `exclude`. Returns the number of packets written.
pub fn filter<R, W>(
    stream: &mut PacketStream<R>,
    mut writer: W,
    include: &[u16],
    exclude: &[u16],
) -> Result<usize>
where
    R: Read + Seek,
    W: Write,
{
    if include.is_empty() && exclude.is_empty() {
        bail!("no filters specified");
    }
    let exclude: HashSet<u16> = exclude.iter().copied().collect();

    let mut count = 0;
    let mut headers = stream.headers(include.iter().copied());
    while let Some(zult) = headers.next() {
        let header = zult.context("reading packet headers")?;
        if exclude.contains(&header.channel_id) {
            trace!(channel_id = header.channel_id, "skip excluded");
            continue;
        }
        let offset = headers.offset().unwrap_or_default();
        let data = headers
            .stream()
            .read_packet()
            .with_context(|| format!("reading packet at offset {offset}"))?;
        writer.write_all(data)?;
        count += 1;
    }

    Ok(count)
}
