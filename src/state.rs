use std::sync::atomic::{AtomicU8, Ordering};

/// What the shipper currently believes about the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No probe has finished yet.
    Unknown,
    Healthy,
    Unhealthy,
}

impl ConnectionState {
    fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Unknown => 0,
            ConnectionState::Healthy => 1,
            ConnectionState::Unhealthy => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Healthy,
            2 => ConnectionState::Unhealthy,
            _ => ConnectionState::Unknown,
        }
    }
}

/// The single owned cell holding a shipper's [`ConnectionState`].
///
/// Written by the connection monitor and by terminal write failures only.
#[derive(Debug)]
pub struct ConnectionCell {
    raw: AtomicU8,
}

impl ConnectionCell {
    pub fn new() -> Self {
        ConnectionCell {
            raw: AtomicU8::new(ConnectionState::Unknown.to_u8()),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Store `state`, returning the previous one.
    pub fn set(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.raw.swap(state.to_u8(), Ordering::AcqRel))
    }
}

impl Default for ConnectionCell {
    fn default() -> Self {
        ConnectionCell::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_reports_previous_state() {
        let cell = ConnectionCell::new();
        assert_eq!(cell.get(), ConnectionState::Unknown);

        assert_eq!(cell.set(ConnectionState::Healthy), ConnectionState::Unknown);
        assert_eq!(cell.set(ConnectionState::Unhealthy), ConnectionState::Healthy);
        assert_eq!(cell.get(), ConnectionState::Unhealthy);
    }
}
