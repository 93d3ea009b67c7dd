use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus timeout")]
    Timeout,
    #[error("malformed frame: {0}")]
    Frame(String),
    #[error("checksum mismatch on slot {slot}")]
    Checksum { slot: u8 },
    #[error("serial port error: {0}")]
    Port(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BusError>;
