use crate::hex::DecodeHexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GenericError {
    Timeout,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // Transport errors
    Read,
    Write,

    // Buffer capacity exceeded while formatting a command or reading a reply
    Overflow,

    /// Pattern set is empty, holds more than five slots, or contains an empty
    /// pattern
    InvalidPattern,

    // Device replies
    ErrorResponse,
    InvalidResponse,

    BaudDetection,

    Decode(DecodeHexError),

    // Generic shared errors
    Generic(GenericError),
}

impl Error {
    pub const fn unsupported() -> Self {
        Self::Generic(GenericError::Unsupported)
    }

    pub const fn timeout() -> Self {
        Self::Generic(GenericError::Timeout)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            Self::Read => defmt::write!(f, "Read"),
            Self::Write => defmt::write!(f, "Write"),
            Self::Overflow => defmt::write!(f, "Overflow"),
            Self::InvalidPattern => defmt::write!(f, "InvalidPattern"),
            Self::ErrorResponse => defmt::write!(f, "ErrorResponse"),
            Self::InvalidResponse => defmt::write!(f, "InvalidResponse"),
            Self::BaudDetection => defmt::write!(f, "BaudDetection"),
            Self::Decode(e) => defmt::write!(f, "Decode({:?})", e),
            Self::Generic(e) => defmt::write!(f, "Generic({:?})", e),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read => f.write_str("serial read failed"),
            Self::Write => f.write_str("serial write failed"),
            Self::Overflow => f.write_str("buffer capacity exceeded"),
            Self::InvalidPattern => f.write_str("invalid response pattern set"),
            Self::ErrorResponse => f.write_str("device answered with an error"),
            Self::InvalidResponse => f.write_str("unexpected response from device"),
            Self::BaudDetection => f.write_str("no baud rate produced a response"),
            Self::Decode(e) => write!(f, "text decode failed: {}", e),
            Self::Generic(GenericError::Timeout) => f.write_str("timed out"),
            Self::Generic(GenericError::Unsupported) => {
                f.write_str("operation not supported by this modem family")
            }
        }
    }
}

impl From<DecodeHexError> for Error {
    fn from(e: DecodeHexError) -> Self {
        Self::Decode(e)
    }
}
