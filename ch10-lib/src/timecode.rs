//! Packet time tag decoding.
//!
//! Packets carry a 48-bit relative time counter in the primary header and, optionally,
//! an absolute time in the secondary header whose format is given by the packet flags.
use hifitime::{Duration, Epoch};

use crate::header::{PacketHeader, TimeFormat};

/// Number of seconds between 1900 (hifitime TAI reference) and the 1970 IEEE-1588 epoch
const PTP_HIFIEPOCH_DELTA_SECS: u64 = 2_208_988_800;
/// Nanoseconds per relative time counter tick (10 MHz)
const RTC_TICK_NANOS: u64 = 100;

/// Absolute time decoded from a secondary header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecondaryTime {
    /// Chapter 4 binary weighted time: 10 millisecond ticks since the start of the year
    /// plus microseconds. The year is not part of the time.
    Ch4Binary { ticks: u32, micros: u16 },
    Ieee1588(Epoch),
    /// Extended relative time counter in nanoseconds.
    Ertc(u64),
}

impl SecondaryTime {
    /// Offset into the year for Chapter 4 times, otherwise `None`.
    #[must_use]
    pub fn since_start_of_year(&self) -> Option<Duration> {
        match self {
            SecondaryTime::Ch4Binary { ticks, micros } => Some(Duration::compose(
                0,
                0,
                0,
                0,
                0,
                u64::from(*ticks) * 10,
                u64::from(*micros),
                0,
            )),
            _ => None,
        }
    }
}

/// Decode the secondary header time of `header`.
///
/// Returns `None` if there is no secondary header or the time format is reserved.
#[must_use]
pub fn decode_secondary(header: &PacketHeader) -> Option<SecondaryTime> {
    let secondary = header.secondary.as_ref()?;
    let [lo, hi] = secondary.time;
    match header.time_format() {
        TimeFormat::Ch4Binary => Some(SecondaryTime::Ch4Binary {
            ticks: hi,
            micros: (lo & 0xffff) as u16,
        }),
        TimeFormat::Ieee1588 => Some(SecondaryTime::Ieee1588(ieee1588_epoch(hi, lo))),
        TimeFormat::Ertc => Some(SecondaryTime::Ertc(u64::from(hi) << 32 | u64::from(lo))),
        TimeFormat::Reserved => None,
    }
}

/// Convert IEEE-1588 seconds and nanoseconds (TAI, 1970 epoch) to an [Epoch].
#[must_use]
pub fn ieee1588_epoch(seconds: u32, nanos: u32) -> Epoch {
    let dur = Duration::compose(
        0,
        0,
        0,
        0,
        // Add in delta to get to hifi epoch
        u64::from(seconds) + PTP_HIFIEPOCH_DELTA_SECS,
        0,
        0,
        u64::from(nanos),
    );
    Epoch::from_tai_duration(dur)
}

/// Relative time counter of `header` as a duration.
#[must_use]
pub fn rtc_duration(header: &PacketHeader) -> Duration {
    Duration::compose(0, 0, 0, 0, 0, 0, 0, header.rtc() * RTC_TICK_NANOS)
}
