//! Control-point payload codec.
//!
//! Writes are decoded into a [`Request`]; reads are encoded from the
//! current light state and settings.  Every length is fixed, so a payload
//! that is not exactly the right size is rejected before anything runs.

use crate::app::light_engine::{AppliedLightState, Selection};
use crate::config::Settings;
use crate::error::ValidationError;
use crate::recipes::Rgbw;

use super::ControlPoint;
use super::command::ControlCommand;

/// Recipe-select read value when the strip shows a custom colour.
pub const CUSTOM_SENTINEL: u8 = 0xFF;

/// First byte of the settings record.
pub const SETTINGS_TAG: u8 = 0x8C;

pub const SETTINGS_RECORD_LEN: usize = 5;

const RECIPE_WRITE_LEN: usize = 1;
const CUSTOM_WRITE_LEN: usize = 4;

/// A decoded control-point write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Raw recipe code; may still be unknown to the recipe table.
    SelectRecipe(u8),
    CustomColor(Rgbw),
    Command(ControlCommand),
}

pub fn decode_write(point: ControlPoint, data: &[u8]) -> Result<Request, ValidationError> {
    match point {
        ControlPoint::RecipeSelect => {
            let [code] = exact::<RECIPE_WRITE_LEN>(data)?;
            Ok(Request::SelectRecipe(code))
        }
        ControlPoint::CustomColor => {
            let bytes = exact::<CUSTOM_WRITE_LEN>(data)?;
            Ok(Request::CustomColor(Rgbw::from_bytes(bytes)))
        }
        ControlPoint::ControlCommand => ControlCommand::decode(data).map(Request::Command),
    }
}

fn exact<const N: usize>(data: &[u8]) -> Result<[u8; N], ValidationError> {
    data.try_into().map_err(|_| ValidationError::InvalidLength {
        expected: N,
        actual: data.len(),
    })
}

/// Recipe-select read: the applied recipe code, or the custom sentinel.
pub fn encode_recipe(state: &AppliedLightState) -> [u8; 1] {
    match state.selection {
        Selection::Recipe(id) => [id.code()],
        Selection::Custom => [CUSTOM_SENTINEL],
    }
}

/// Custom-color read: the colour actually on the strip.
pub fn encode_color(state: &AppliedLightState) -> [u8; 4] {
    state.frame.to_bytes()
}

/// Control-command read / notification: the settings record.
pub fn encode_settings(settings: &Settings) -> [u8; SETTINGS_RECORD_LEN] {
    [
        SETTINGS_TAG,
        settings.on_duration_hours,
        settings.off_duration_hours,
        settings.auto_recipe.code(),
        u8::from(settings.auto_cycle_enabled),
    ]
}
