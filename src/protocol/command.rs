//! Control-command characteristic: opcode byte followed by fixed-size arguments.

use crate::config::MAX_PHASE_HOURS;
use crate::error::ValidationError;

/// Wire opcodes.
pub mod opcode {
    pub const OFF: u8 = 0x00;
    pub const ON: u8 = 0x01;
    pub const SET_SCHEDULE: u8 = 0x02;
    pub const SET_AUTO_RECIPE: u8 = 0x03;
    pub const SET_AUTO_ENABLED: u8 = 0x04;
    pub const GET_SETTINGS: u8 = 0x0C;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Render the Off recipe.
    Off,
    /// Render the configured auto recipe as a manual action.
    On,
    SetSchedule { on_hours: u8, off_hours: u8 },
    /// Raw recipe code; resolved against the recipe table when applied.
    SetAutoRecipe(u8),
    SetAutoEnabled(bool),
    /// Notify the current settings record.
    GetSettings,
}

impl ControlCommand {
    pub fn decode(data: &[u8]) -> Result<Self, ValidationError> {
        let (&op, args) = data.split_first().ok_or(ValidationError::InvalidLength {
            expected: 1,
            actual: 0,
        })?;

        let cmd = match op {
            opcode::OFF => {
                expect_args(args, 0)?;
                Self::Off
            }
            opcode::ON => {
                expect_args(args, 0)?;
                Self::On
            }
            opcode::SET_SCHEDULE => {
                expect_args(args, 2)?;
                Self::SetSchedule {
                    on_hours: hours(args[0], "on_hours")?,
                    off_hours: hours(args[1], "off_hours")?,
                }
            }
            opcode::SET_AUTO_RECIPE => {
                expect_args(args, 1)?;
                Self::SetAutoRecipe(args[0])
            }
            opcode::SET_AUTO_ENABLED => {
                expect_args(args, 1)?;
                match args[0] {
                    0 => Self::SetAutoEnabled(false),
                    1 => Self::SetAutoEnabled(true),
                    _ => return Err(ValidationError::ValueNotAllowed("auto_enabled")),
                }
            }
            opcode::GET_SETTINGS => {
                expect_args(args, 0)?;
                Self::GetSettings
            }
            other => return Err(ValidationError::UnknownCommand(other)),
        };
        Ok(cmd)
    }

    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Off => opcode::OFF,
            Self::On => opcode::ON,
            Self::SetSchedule { .. } => opcode::SET_SCHEDULE,
            Self::SetAutoRecipe(_) => opcode::SET_AUTO_RECIPE,
            Self::SetAutoEnabled(_) => opcode::SET_AUTO_ENABLED,
            Self::GetSettings => opcode::GET_SETTINGS,
        }
    }

    /// Whether the command changes the persisted settings.
    pub const fn mutates_settings(&self) -> bool {
        matches!(
            self,
            Self::SetSchedule { .. } | Self::SetAutoRecipe(_) | Self::SetAutoEnabled(_)
        )
    }
}

fn expect_args(args: &[u8], n: usize) -> Result<(), ValidationError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(ValidationError::InvalidLength {
            expected: n + 1,
            actual: args.len() + 1,
        })
    }
}

fn hours(value: u8, field: &'static str) -> Result<u8, ValidationError> {
    if value <= MAX_PHASE_HOURS {
        Ok(value)
    } else {
        Err(ValidationError::ValueNotAllowed(field))
    }
}
