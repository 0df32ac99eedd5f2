//! BLE control protocol.
//!
//! Three control points share one primary service:
//!
//! ```text
//! ┌────────────────┬─────────────────────┬───────────────────────────┐
//! │ Control point  │ Write               │ Read / notify             │
//! ├────────────────┼─────────────────────┼───────────────────────────┤
//! │ recipe-select  │ [code]              │ [code] or [0xFF] = custom │
//! │ custom-color   │ [r, g, b, w]        │ [r, g, b, w] on the strip │
//! │ control        │ [opcode, args...]   │ [0x8C, on, off, rcp, en]  │
//! └────────────────┴─────────────────────┴───────────────────────────┘
//! ```
//!
//! Decoding checks lengths and numeric ranges only.  Recipe codes are
//! resolved against the recipe table by the consumer.

pub mod codec;
pub mod command;
pub mod status;

pub use codec::{Request, decode_write};
pub use command::ControlCommand;
pub use status::ProtocolStatus;

/// One of the three GATT characteristics of the light service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPoint {
    RecipeSelect,
    CustomColor,
    ControlCommand,
}

impl ControlPoint {
    pub const ALL: [Self; 3] = [Self::RecipeSelect, Self::CustomColor, Self::ControlCommand];

    /// Dense index for per-characteristic tables.
    pub const fn index(self) -> usize {
        match self {
            Self::RecipeSelect => 0,
            Self::CustomColor => 1,
            Self::ControlCommand => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RecipeSelect => "recipe",
            Self::CustomColor => "custom",
            Self::ControlCommand => "control",
        }
    }
}
