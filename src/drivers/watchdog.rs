//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the run loop
//! stalls for longer than the configured deadline.
//!
//! The run loop must call `feed()` on every iteration.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;
#[cfg(target_os = "espidf")]
use log::error;

use crate::app::ports::LivenessPort;
use crate::error::Error;

pub struct Watchdog {
    timeout_ms: u32,
    subscribed: bool,
    /// Simulation: number of feeds since arming.
    #[cfg(not(target_os = "espidf"))]
    feeds: u64,
    /// Simulation: refuse to subscribe, as a TWDT that cannot start would.
    #[cfg(not(target_os = "espidf"))]
    pub fail_arm: bool,
}

impl Watchdog {
    /// Does not touch the TWDT until [`arm`](LivenessPort::arm).
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            subscribed: false,
            #[cfg(not(target_os = "espidf"))]
            feeds: 0,
            #[cfg(not(target_os = "espidf"))]
            fail_arm: false,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

impl LivenessPort for Watchdog {
    /// Initialise (or reconfigure) the TWDT and subscribe the current task.
    fn arm(&mut self) -> Result<(), Error> {
        if self.subscribed {
            return Ok(());
        }

        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: self.timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: called once from the main task before the loop starts.
            let mut ret = unsafe { esp_task_wdt_init(&cfg) };
            if ret == ESP_ERR_INVALID_STATE {
                // Already started by the bootloader config; apply our deadline.
                ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            }
            if ret != ESP_OK {
                error!("Watchdog: TWDT init failed ({})", ret);
                return Err(Error::Init("task watchdog"));
            }

            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            if ret != ESP_OK {
                error!("Watchdog: failed to subscribe ({})", ret);
                return Err(Error::Init("task watchdog"));
            }
            info!(
                "Watchdog: subscribed ({} ms timeout, panic on trigger)",
                self.timeout_ms
            );
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if self.fail_arm {
                return Err(Error::Init("task watchdog"));
            }
            info!("Watchdog(sim): armed ({} ms)", self.timeout_ms);
        }

        self.subscribed = true;
        Ok(())
    }

    /// Feed the watchdog. Must be called at least once per deadline.
    fn feed(&mut self) {
        if !self.subscribed {
            return;
        }

        #[cfg(target_os = "espidf")]
        unsafe {
            esp_task_wdt_reset();
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.feeds += 1;
        }
    }
}
