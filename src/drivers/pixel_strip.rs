//! Addressable RGBW strip driver (SK6812-class, GRBW byte order).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: one RMT channel clocks the frame out through
//! `ws2812-esp32-rmt-driver`.
//! On host/test: keeps the last frame in memory and can be told to fail.

use log::info;

use crate::app::ports::PixelPort;
use crate::error::RenderFailure;
use crate::recipes::Rgbw;

#[cfg(target_os = "espidf")]
use crate::error::Error;
#[cfg(target_os = "espidf")]
use esp_idf_hal::{gpio::OutputPin, peripheral::Peripheral, rmt::RmtChannel};
#[cfg(target_os = "espidf")]
use smart_leds_trait::{SmartLedsWrite, White};
#[cfg(target_os = "espidf")]
use ws2812_esp32_rmt_driver::{LedPixelEsp32Rmt, RGBW8, driver::color::LedPixelColorGrbw32};

#[cfg(target_os = "espidf")]
type StripDriver = LedPixelEsp32Rmt<'static, RGBW8, LedPixelColorGrbw32>;

pub struct PixelStrip {
    pixel_count: usize,
    #[cfg(target_os = "espidf")]
    driver: StripDriver,
    /// Simulation: the last frame accepted.
    #[cfg(not(target_os = "espidf"))]
    last_frame: Vec<Rgbw>,
    #[cfg(not(target_os = "espidf"))]
    renders: u32,
    /// Simulation: reject every frame while set.
    #[cfg(not(target_os = "espidf"))]
    pub fail: bool,
}

impl PixelStrip {
    #[cfg(target_os = "espidf")]
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
        pixel_count: usize,
    ) -> Result<Self, Error> {
        let driver = StripDriver::new(channel, pin).map_err(|e| {
            log::error!("PixelStrip: RMT driver init failed ({:?})", e);
            Error::Init("pixel strip")
        })?;
        info!("PixelStrip: {} RGBW pixels on RMT", pixel_count);
        let mut strip = Self {
            pixel_count,
            driver,
        };
        // Pixels latch whatever they held before the reset; start dark.
        let blank = core::iter::repeat_n(RGBW8::new_alpha(0, 0, 0, White(0)), pixel_count);
        if let Err(e) = strip.driver.write(blank) {
            log::warn!("PixelStrip: initial blank frame failed ({:?})", e);
        }
        Ok(strip)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(pixel_count: usize) -> Self {
        info!("PixelStrip(sim): {} RGBW pixels", pixel_count);
        Self {
            pixel_count,
            last_frame: Vec::new(),
            renders: 0,
            fail: false,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn last_frame(&self) -> &[Rgbw] {
        &self.last_frame
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn renders(&self) -> u32 {
        self.renders
    }

    fn check_len(&self, frame: &[Rgbw]) -> Result<(), RenderFailure> {
        if frame.len() == self.pixel_count {
            Ok(())
        } else {
            Err(RenderFailure::FrameLength {
                expected: self.pixel_count,
                actual: frame.len(),
            })
        }
    }
}

impl PixelPort for PixelStrip {
    #[cfg(target_os = "espidf")]
    fn render(&mut self, frame: &[Rgbw]) -> Result<(), RenderFailure> {
        self.check_len(frame)?;
        let pixels = frame
            .iter()
            .map(|px| RGBW8::new_alpha(px.r, px.g, px.b, White(px.w)));
        self.driver.write(pixels).map_err(|e| {
            log::warn!("PixelStrip: transmit failed ({:?})", e);
            RenderFailure::Transmit
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn render(&mut self, frame: &[Rgbw]) -> Result<(), RenderFailure> {
        self.check_len(frame)?;
        if self.fail {
            return Err(RenderFailure::Transmit);
        }
        self.last_frame.clear();
        self.last_frame.extend_from_slice(frame);
        self.renders += 1;
        Ok(())
    }
}
