//! Static recipe table.
//!
//! Each recipe is a fixed RGBW colour applied uniformly to the whole strip.
//! The wire code of a recipe is its position in [`RecipeId::ALL`]; codes
//! are part of the BLE contract and must never be reordered.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Channel, InvalidRecipe, OutOfRange};

/// One pixel worth of colour: four 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Rgbw {
    pub const OFF: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Validate four wide integers and narrow them to a colour.
    ///
    /// Reports the first channel (in R, G, B, W order) outside 0–255.
    pub fn from_channels(r: i32, g: i32, b: i32, w: i32) -> Result<Self, OutOfRange> {
        fn narrow(channel: Channel, value: i32) -> Result<u8, OutOfRange> {
            u8::try_from(value).map_err(|_| OutOfRange { channel, value })
        }
        Ok(Self {
            r: narrow(Channel::Red, r)?,
            g: narrow(Channel::Green, g)?,
            b: narrow(Channel::Blue, b)?,
            w: narrow(Channel::White, w)?,
        })
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.w]
    }

    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.w == 0
    }
}

impl fmt::Display for Rgbw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.r, self.g, self.b, self.w)
    }
}

/// Recipe identifiers. The discriminant is the wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecipeId {
    Balanced = 0,
    Warm = 1,
    Cool = 2,
    Daylight = 3,
    VegGrowth = 4,
    Bloom = 5,
    Seedling = 6,
    Succulent = 7,
    PurpleGlow = 8,
    Sunrise = 9,
    Sunset = 10,
    Forest = 11,
    Aquarium = 12,
    NightLight = 13,
    Inspection = 14,
    Off = 15,
}

impl RecipeId {
    /// Every recipe, indexed by wire code.
    pub const ALL: [Self; 16] = [
        Self::Balanced,
        Self::Warm,
        Self::Cool,
        Self::Daylight,
        Self::VegGrowth,
        Self::Bloom,
        Self::Seedling,
        Self::Succulent,
        Self::PurpleGlow,
        Self::Sunrise,
        Self::Sunset,
        Self::Forest,
        Self::Aquarium,
        Self::NightLight,
        Self::Inspection,
        Self::Off,
    ];

    pub fn from_code(code: u8) -> Result<Self, InvalidRecipe> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(InvalidRecipe(code))
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Stable lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Daylight => "daylight",
            Self::VegGrowth => "veg_growth",
            Self::Bloom => "bloom",
            Self::Seedling => "seedling",
            Self::Succulent => "succulent",
            Self::PurpleGlow => "purple_glow",
            Self::Sunrise => "sunrise",
            Self::Sunset => "sunset",
            Self::Forest => "forest",
            Self::Aquarium => "aquarium",
            Self::NightLight => "night_light",
            Self::Inspection => "inspection",
            Self::Off => "off",
        }
    }

    pub const fn color(self) -> Rgbw {
        match self {
            Self::Balanced => Rgbw::new(255, 64, 128, 255),
            Self::Warm => Rgbw::new(255, 140, 20, 255),
            Self::Cool => Rgbw::new(180, 200, 255, 255),
            Self::Daylight => Rgbw::new(255, 230, 210, 255),
            Self::VegGrowth => Rgbw::new(50, 255, 70, 200),
            Self::Bloom => Rgbw::new(255, 100, 10, 150),
            Self::Seedling => Rgbw::new(100, 100, 200, 150),
            Self::Succulent => Rgbw::new(220, 180, 40, 200),
            Self::PurpleGlow => Rgbw::new(180, 0, 255, 0),
            Self::Sunrise => Rgbw::new(255, 50, 20, 100),
            Self::Sunset => Rgbw::new(255, 30, 0, 50),
            Self::Forest => Rgbw::new(30, 200, 30, 120),
            Self::Aquarium => Rgbw::new(0, 200, 255, 50),
            Self::NightLight => Rgbw::new(50, 20, 0, 30),
            Self::Inspection => Rgbw::new(255, 255, 255, 255),
            Self::Off => Rgbw::OFF,
        }
    }
}

impl TryFrom<u8> for RecipeId {
    type Error = InvalidRecipe;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
