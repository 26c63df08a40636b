use std::io::{stdout, Read, Seek, Write};

use anyhow::{Context, Result};
use ch10::{PacketHeader, PacketStream};
use serde::Serialize;

use crate::info::Format;

#[derive(Debug, Serialize)]
struct HeaderLine<'a> {
    offset: u64,
    name: &'static str,
    rtc: u64,
    #[serde(flatten)]
    header: &'a PacketHeader,
}

fn text_line(offset: u64, header: &PacketHeader) -> String {
    format!(
        "{offset:>12} ch={:<5} type={:#04x} {:<24} seq={:<3} len={:<8} data={:<8} rtc={}{}",
        header.channel_id,
        header.data_type.code(),
        header.data_type.name(),
        header.sequence_number,
        header.packet_len,
        header.data_len,
        header.rtc(),
        if header.has_secondary_header() {
            " secondary"
        } else {
            ""
        },
    )
}

fn write_headers<R, W>(
    stream: &mut PacketStream<R>,
    mut writer: W,
    channels: &[u16],
    format: &Format,
) -> Result<()>
where
    R: Read + Seek,
    W: Write,
{
    let mut headers = stream.headers(channels.iter().copied());
    while let Some(zult) = headers.next() {
        let header = zult.context("reading packet headers")?;
        let offset = headers.offset().unwrap_or_default();
        match format {
            Format::Text => writeln!(writer, "{}", text_line(offset, &header))?,
            Format::Json => {
                let line = HeaderLine {
                    offset,
                    name: header.data_type.name(),
                    rtc: header.rtc(),
                    header: &header,
                };
                serde_json::to_writer(&mut writer, &line).context("serializing to json")?;
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}

pub fn headers<R: Read + Seek>(
    stream: &mut PacketStream<R>,
    channels: &[u16],
    format: &Format,
) -> Result<()> {
    write_headers(stream, stdout().lock(), channels, format)
}
