//! ATT status codes returned for control-point writes.
//!
//! Standard ATT codes where one fits; the 0x80 range is the
//! application-defined space.

use crate::error::{Error, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolStatus {
    Success = 0x00,
    /// Write from a central that does not own the session.
    WriteNotPermitted = 0x03,
    InvalidLength = 0x0D,
    ValueNotAllowed = 0x13,
    InvalidRecipe = 0x80,
    PersistFailure = 0x81,
    RenderFailure = 0x82,
    UnknownCommand = 0x83,
}

impl ProtocolStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<&Error> for ProtocolStatus {
    fn from(e: &Error) -> Self {
        match e {
            Error::Validation(ValidationError::InvalidLength { .. }) => Self::InvalidLength,
            Error::Validation(ValidationError::UnknownCommand(_)) => Self::UnknownCommand,
            Error::Validation(ValidationError::ValueNotAllowed(_)) | Error::OutOfRange(_) => {
                Self::ValueNotAllowed
            }
            Error::InvalidRecipe(_) => Self::InvalidRecipe,
            Error::Persist(_) => Self::PersistFailure,
            Error::Render(_) | Error::Init(_) => Self::RenderFailure,
        }
    }
}
