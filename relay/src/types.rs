use serde::{Deserialize, Serialize};

/// Result code handed back to the consumer runtime for every read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    /// Nothing to read yet; poll again later.
    Again,
    Invalid,
    Unspecified,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Again => write!(f, "again"),
            Status::Invalid => write!(f, "invalid"),
            Status::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Connection transitions emitted by the radio's station state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    Start,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionEvent::Start => write!(f, "start"),
            ConnectionEvent::Connected => write!(f, "connected"),
            ConnectionEvent::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// 48-bit hardware address of the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub mac: MacAddress,
    pub mtu: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_display() {
        let mac = MacAddress([0x02, 0x52, 0x4f, 0x53, 0x53, 0x00]);
        assert_eq!(mac.to_string(), "02:52:4f:53:53:00");
    }
}
