#![allow(dead_code)]
use std::io::Write;
use std::path::PathBuf;

use ch10::{DataType, PacketHeader};
use rand::Rng;

/// Build a packet with `data` followed by filler to a 4 byte boundary.
pub fn packet(channel_id: u16, data_type: DataType, seq: u8, data: &[u8]) -> Vec<u8> {
    let mut header = PacketHeader::new(channel_id, data_type, data.len() as u32);
    header.sequence_number = seq;
    let header = header.with_checksums();
    let mut dat = header.encode();
    dat.extend_from_slice(data);
    dat.resize(header.packet_len as usize, 0);
    dat
}

/// A recording with a TMATS packet on channel 0 followed by one analog packet with a
/// random payload for each channel in `channels`.
pub fn recording(channels: &[u16]) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut dat = packet(0, DataType::TMATS, 0, b"G\\DSI\\N:1;");
    for (idx, ch) in channels.iter().enumerate() {
        let len = rng.gen_range(1..200);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        dat.extend(packet(*ch, DataType::ANALOG, idx as u8, &payload));
    }
    dat
}

/// Write `dat` to a file in `dir`.
pub fn write_recording(dir: &tempfile::TempDir, name: &str, dat: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create recording");
    file.write_all(dat).expect("write recording");
    path
}
