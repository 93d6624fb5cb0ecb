//! MQTT-SN return codes

use std::fmt;

/// Return code carried by acknowledgements to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ReturnCode {
    /// Accepted
    #[default]
    Accepted = 0x00,
    /// Rejected: congestion (also used for capacity and authorization denial)
    RejectedCongestion = 0x01,
    /// Rejected: invalid topic id
    InvalidTopicId = 0x02,
    /// Rejected: not supported
    NotSupported = 0x03,
}

impl ReturnCode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(ReturnCode::Accepted),
            0x01 => Some(ReturnCode::RejectedCongestion),
            0x02 => Some(ReturnCode::InvalidTopicId),
            0x03 => Some(ReturnCode::NotSupported),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        *self == ReturnCode::Accepted
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReturnCode::Accepted => "Accepted",
            ReturnCode::RejectedCongestion => "Rejected: congestion",
            ReturnCode::InvalidTopicId => "Rejected: invalid topic ID",
            ReturnCode::NotSupported => "Rejected: not supported",
        };
        write!(f, "{}", s)
    }
}
