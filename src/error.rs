//! Unified error types for the grow-light firmware.
//!
//! Every fallible path funnels into [`Error`], which the protocol layer maps
//! onto a wire status byte.  All variants are `Copy` so they can be passed
//! through the run loop and event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed or out-of-range write payload.
    Validation(ValidationError),
    /// Recipe code not present in the recipe table.
    InvalidRecipe(InvalidRecipe),
    /// A custom colour channel outside 0–255.
    OutOfRange(OutOfRange),
    /// Settings could not be persisted.
    Persist(PersistFailure),
    /// The pixel driver rejected a frame.
    Render(RenderFailure),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::InvalidRecipe(e) => write!(f, "{e}"),
            Self::OutOfRange(e) => write!(f, "{e}"),
            Self::Persist(e) => write!(f, "persist: {e}"),
            Self::Render(e) => write!(f, "render: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Payload length does not match the control point / opcode.
    InvalidLength { expected: usize, actual: usize },
    /// Control-command opcode is not recognised.
    UnknownCommand(u8),
    /// A field is outside its allowed range.
    ValueNotAllowed(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { expected, actual } => {
                write!(f, "expected {expected} bytes, got {actual}")
            }
            Self::UnknownCommand(op) => write!(f, "unknown command 0x{op:02X}"),
            Self::ValueNotAllowed(field) => write!(f, "{field} out of range"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Recipe lookup
// ---------------------------------------------------------------------------

/// Carries the rejected recipe code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRecipe(pub u8);

impl fmt::Display for InvalidRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown recipe {}", self.0)
    }
}

impl From<InvalidRecipe> for Error {
    fn from(e: InvalidRecipe) -> Self {
        Self::InvalidRecipe(e)
    }
}

// ---------------------------------------------------------------------------
// Custom colour range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    White,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::White => "white",
        };
        f.write_str(name)
    }
}

/// First channel found outside 0–255, with the offending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub channel: Channel,
    pub value: i32,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} channel {} outside 0-255", self.channel, self.value)
    }
}

impl From<OutOfRange> for Error {
    fn from(e: OutOfRange) -> Self {
        Self::OutOfRange(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistFailure {
    /// The record could not be serialised.
    Encode,
    /// The storage backend returned an error code.
    Io(i32),
    /// The storage partition has no free pages.
    Full,
}

impl fmt::Display for PersistFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "settings encode failed"),
            Self::Io(code) => write!(f, "storage I/O error {code}"),
            Self::Full => write!(f, "storage full"),
        }
    }
}

impl From<PersistFailure> for Error {
    fn from(e: PersistFailure) -> Self {
        Self::Persist(e)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFailure {
    /// The RMT transmission did not complete.
    Transmit,
    /// Frame length does not match the strip.
    FrameLength { expected: usize, actual: usize },
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transmit => write!(f, "pixel transmit failed"),
            Self::FrameLength { expected, actual } => {
                write!(f, "frame has {actual} pixels, strip has {expected}")
            }
        }
    }
}

impl From<RenderFailure> for Error {
    fn from(e: RenderFailure) -> Self {
        Self::Render(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
