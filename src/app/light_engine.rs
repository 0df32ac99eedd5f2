//! Light engine: recipes and custom colours → uniform frames on the strip.
//!
//! The engine owns the frame buffer and the record of what the strip is
//! actually showing.  That record only moves after the pixel driver
//! accepts a frame, so a failed render leaves the previous state intact.

use heapless::Vec;

use crate::error::{RenderFailure, Result};
use crate::recipes::{RecipeId, Rgbw};

use super::ports::PixelPort;

/// Largest strip the frame buffer can address.
pub const MAX_PIXELS: usize = 256;

/// Who asked for the frame currently on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Manual,
    Scheduled,
}

/// What produced the frame currently on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Recipe(RecipeId),
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedLightState {
    pub source: Source,
    pub frame: Rgbw,
    pub selection: Selection,
}

impl AppliedLightState {
    /// The strip right after driver initialisation.
    pub const DARK: Self = Self {
        source: Source::Scheduled,
        frame: Rgbw::OFF,
        selection: Selection::Recipe(RecipeId::Off),
    };
}

pub struct LightEngine {
    buffer: Vec<Rgbw, MAX_PIXELS>,
    state: AppliedLightState,
}

impl LightEngine {
    /// `pixel_count` is capped at [`MAX_PIXELS`].
    pub fn new(pixel_count: usize) -> Self {
        let count = pixel_count.min(MAX_PIXELS);
        if count < pixel_count {
            log::warn!(
                "LightEngine: strip of {} pixels truncated to {}",
                pixel_count,
                count
            );
        }
        let mut buffer = Vec::new();
        buffer.resize(count, Rgbw::OFF).ok();
        Self {
            buffer,
            state: AppliedLightState::DARK,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.buffer.len()
    }

    /// Look up `code` in the recipe table and render it.
    pub fn apply_recipe(
        &mut self,
        code: u8,
        source: Source,
        pixels: &mut impl PixelPort,
    ) -> Result<()> {
        let recipe = RecipeId::from_code(code)?;
        self.apply(recipe, source, pixels)?;
        Ok(())
    }

    /// Render a recipe that is already known to exist.
    pub fn apply(
        &mut self,
        recipe: RecipeId,
        source: Source,
        pixels: &mut impl PixelPort,
    ) -> core::result::Result<(), RenderFailure> {
        self.render(recipe.color(), source, Selection::Recipe(recipe), pixels)
    }

    /// Validate and render an explicit colour. Always a manual action.
    pub fn apply_custom(
        &mut self,
        r: i32,
        g: i32,
        b: i32,
        w: i32,
        pixels: &mut impl PixelPort,
    ) -> Result<()> {
        let color = Rgbw::from_channels(r, g, b, w)?;
        self.render(color, Source::Manual, Selection::Custom, pixels)?;
        Ok(())
    }

    pub fn turn_off(
        &mut self,
        source: Source,
        pixels: &mut impl PixelPort,
    ) -> core::result::Result<(), RenderFailure> {
        self.apply(RecipeId::Off, source, pixels)
    }

    pub fn current_state(&self) -> AppliedLightState {
        self.state
    }

    fn render(
        &mut self,
        color: Rgbw,
        source: Source,
        selection: Selection,
        pixels: &mut impl PixelPort,
    ) -> core::result::Result<(), RenderFailure> {
        self.buffer.iter_mut().for_each(|px| *px = color);
        pixels.render(&self.buffer)?;
        self.state = AppliedLightState {
            source,
            frame: color,
            selection,
        };
        Ok(())
    }
}
