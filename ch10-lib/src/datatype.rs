//! Packet content types.
use std::fmt::Display;

/// Name given to content type codes that are not in the catalog.
pub const UNDEFINED: &str = "Undefined";

/// Packet content type code, as carried in the `DataType` header field.
///
/// Any `u8` is a valid `DataType`; codes not defined by the standard are reported with
/// the name [UNDEFINED].
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataType(pub u8);

impl DataType {
    pub const COMPUTER_0: DataType = DataType(0x00);
    pub const USER_DEFINED: DataType = DataType(0x00);
    pub const COMPUTER_1: DataType = DataType(0x01);
    pub const TMATS: DataType = DataType(0x01);
    pub const COMPUTER_2: DataType = DataType(0x02);
    pub const RECORDING_EVENT: DataType = DataType(0x02);
    pub const COMPUTER_3: DataType = DataType(0x03);
    pub const RECORDING_INDEX: DataType = DataType(0x03);
    pub const COMPUTER_4: DataType = DataType(0x04);
    pub const COMPUTER_5: DataType = DataType(0x05);
    pub const COMPUTER_6: DataType = DataType(0x06);
    pub const COMPUTER_7: DataType = DataType(0x07);
    pub const PCM_FMT_0: DataType = DataType(0x08);
    pub const PCM_FMT_1: DataType = DataType(0x09);
    pub const IRIG_TIME: DataType = DataType(0x11);
    pub const MIL1553_FMT_1: DataType = DataType(0x19);
    /// 16PP194 Bus
    pub const MIL1553_16PP194: DataType = DataType(0x1A);
    pub const ANALOG: DataType = DataType(0x21);
    pub const DISCRETE: DataType = DataType(0x29);
    pub const MESSAGE: DataType = DataType(0x30);
    pub const ARINC_429_FMT_0: DataType = DataType(0x38);
    pub const VIDEO_FMT_0: DataType = DataType(0x40);
    pub const VIDEO_FMT_1: DataType = DataType(0x41);
    pub const VIDEO_FMT_2: DataType = DataType(0x42);
    pub const IMAGE_FMT_0: DataType = DataType(0x48);
    pub const IMAGE_FMT_1: DataType = DataType(0x49);
    pub const UART_FMT_0: DataType = DataType(0x50);
    pub const IEEE1394_FMT_0: DataType = DataType(0x58);
    pub const IEEE1394_FMT_1: DataType = DataType(0x59);
    pub const PARALLEL_FMT_0: DataType = DataType(0x60);
    pub const ETHERNET_FMT_0: DataType = DataType(0x68);
    pub const CAN_BUS: DataType = DataType(0x78);
    pub const FIBRE_CHAN_FMT_0: DataType = DataType(0x79);
    pub const FIBRE_CHAN_FMT_1: DataType = DataType(0x7A);

    /// Display name for this type, or [UNDEFINED].
    #[must_use]
    pub fn name(self) -> &'static str {
        name(self.0)
    }

    #[must_use]
    pub fn code(self) -> u8 {
        self.0
    }

    /// True if the code is in the catalog.
    #[must_use]
    pub fn is_defined(self) -> bool {
        self.name() != UNDEFINED
    }
}

/// Display name for a content type code. Never fails; unknown codes are [UNDEFINED].
#[must_use]
pub fn name(code: u8) -> &'static str {
    match DataType(code) {
        DataType::USER_DEFINED => "User Defined",
        DataType::TMATS => "TMATS",
        DataType::RECORDING_EVENT => "Event",
        DataType::RECORDING_INDEX => "Index",
        DataType::COMPUTER_4 => "Computer Generated 4",
        DataType::COMPUTER_5 => "Computer Generated 5",
        DataType::COMPUTER_6 => "Computer Generated 6",
        DataType::COMPUTER_7 => "Computer Generated 7",
        DataType::PCM_FMT_0 => "PCM Format 0",
        DataType::PCM_FMT_1 => "PCM Format 1",
        DataType::IRIG_TIME => "Time",
        DataType::MIL1553_FMT_1 => "1553",
        DataType::MIL1553_16PP194 => "16PP194",
        DataType::ANALOG => "Analog",
        DataType::DISCRETE => "Discrete",
        DataType::MESSAGE => "Message",
        DataType::ARINC_429_FMT_0 => "ARINC 429",
        DataType::VIDEO_FMT_0 => "Video Format 0",
        DataType::VIDEO_FMT_1 => "Video Format 1",
        DataType::VIDEO_FMT_2 => "Video Format 2",
        DataType::IMAGE_FMT_0 => "Image Format 0",
        DataType::IMAGE_FMT_1 => "Image Format 1",
        DataType::UART_FMT_0 => "UART",
        DataType::IEEE1394_FMT_0 => "IEEE 1394 Format 0",
        DataType::IEEE1394_FMT_1 => "IEEE 1394 Format 1",
        DataType::PARALLEL_FMT_0 => "Parallel",
        DataType::ETHERNET_FMT_0 => "Ethernet",
        DataType::CAN_BUS => "CAN Bus",
        DataType::FIBRE_CHAN_FMT_0 => "Fibre Channel Format 0",
        DataType::FIBRE_CHAN_FMT_1 => "Fibre Channel Format 1",
        _ => UNDEFINED,
    }
}

impl From<u8> for DataType {
    fn from(code: u8) -> Self {
        DataType(code)
    }
}

impl From<DataType> for u8 {
    fn from(dt: DataType) -> Self {
        dt.0
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
