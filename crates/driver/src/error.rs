use thiserror::Error;

/// Result returned from driver operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    FrameBuffer(#[from] FrameBufferError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// The core refused a ROM image. Why is up to the core (bad header,
/// unsupported mapper, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("core rejected ROM image ({size} bytes)")]
pub struct LoadError {
    pub size: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameBufferError {
    #[error("framebuffer window {start:#x}..{end:#x} exceeds core memory of {len:#x} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("display buffer is {actual} bytes, expected {expected}")]
    OutputSize { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid emulation interval {0} ms")]
    Interval(f64),
    #[error("invalid refresh interval {0} ms")]
    RefreshInterval(f64),
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to encode input log: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode input log: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("input log is out of order at entry {0}")]
    Unordered(usize),
}
