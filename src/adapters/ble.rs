//! BLE GATT adapter.
//!
//! Implements [`AdvertisingPort`] and [`ResponderPort`], the hexagonal
//! boundary for the light service.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via raw `esp_ble_*` calls.
//! - **all other targets**: a recording simulation for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                           | Props              |
//! |----------------|--------------------------------|--------------------|
//! | Recipe select  | `19b10001-…-d104768a1214`      | Read+Write         |
//! | Custom color   | `19b10002-…-d104768a1214`      | Read+Write         |
//! | Control        | `19b10003-…-d104768a1214`      | Read+Write+Notify  |
//!
//! Stack callbacks never touch application state.  Connects, disconnects,
//! and writes are pushed onto [`TRANSPORT_EVENTS`](crate::events::TRANSPORT_EVENTS)
//! and answered later from the run loop.  Reads are served straight from a
//! cache the run loop keeps current through [`ResponderPort::set_value`].

use log::info;
#[cfg(target_os = "espidf")]
use log::{error, warn};

use crate::app::ports::{AdvertisingError, AdvertisingPort, ResponderPort};
use crate::config::ADV_INTERVAL_MS;
use crate::connection::PeerHandle;
use crate::error::Error;
use crate::events::WriteRequest;
use crate::protocol::{ControlPoint, ProtocolStatus};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x19b10000_e8f2_537e_4f6c_d104768a1214;
pub const CHAR_RECIPE: u128 = 0x19b10001_e8f2_537e_4f6c_d104768a1214;
pub const CHAR_CUSTOM: u128 = 0x19b10002_e8f2_537e_4f6c_d104768a1214;
pub const CHAR_CONTROL: u128 = 0x19b10003_e8f2_537e_4f6c_d104768a1214;

/// Client Characteristic Configuration descriptor.
#[cfg(target_os = "espidf")]
const CCCD_UUID: u16 = 0x2902;

/// Legacy advertising payload limit.
pub const MAX_ADV_LEN: usize = 31;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
/// LE General Discoverable, BR/EDR not supported.
const AD_FLAGS: u8 = 0x06;

/// Largest characteristic value served on reads.
pub const MAX_VALUE_LEN: usize = 8;

pub type CharValue = heapless::Vec<u8, MAX_VALUE_LEN>;
pub type AdvPayload = heapless::Vec<u8, MAX_ADV_LEN>;

/// UUID of the characteristic behind `point`.
pub const fn char_uuid(point: ControlPoint) -> u128 {
    match point {
        ControlPoint::RecipeSelect => CHAR_RECIPE,
        ControlPoint::CustomColor => CHAR_CUSTOM,
        ControlPoint::ControlCommand => CHAR_CONTROL,
    }
}

/// Advertising interval in controller units of 0.625 ms.
pub const fn adv_interval_units(ms: u32) -> u16 {
    let units = ms * 1000 / 625;
    if units > u16::MAX as u32 {
        u16::MAX
    } else {
        units as u16
    }
}

/// Raw advertising data: flags followed by the complete local name.
///
/// Names too long for the payload are cut to fit.
pub fn advertising_payload(name: &str) -> AdvPayload {
    let mut adv = AdvPayload::new();
    // Header is 5 bytes; the name gets the rest.
    let room = MAX_ADV_LEN - 5;
    let name = &name.as_bytes()[..name.len().min(room)];
    let _ = adv.extend_from_slice(&[0x02, AD_TYPE_FLAGS, AD_FLAGS]);
    let _ = adv.extend_from_slice(&[name.len() as u8 + 1, AD_TYPE_COMPLETE_NAME]);
    let _ = adv.extend_from_slice(name);
    adv
}

fn char_value(value: &[u8]) -> CharValue {
    let mut v = CharValue::new();
    let _ = v.extend_from_slice(&value[..value.len().min(MAX_VALUE_LEN)]);
    v
}

// ── Notification subscriptions ────────────────────────────────

/// CCCD notify bits, one per Bluedroid `conn_id`.
///
/// Each link owns only its own bit: a rejected central's subscribe or
/// disconnect never touches the session peer's.
pub struct NotifySubscriptions(core::sync::atomic::AtomicU32);

impl NotifySubscriptions {
    pub const fn new() -> Self {
        Self(core::sync::atomic::AtomicU32::new(0))
    }

    fn bit(conn_id: u16) -> u32 {
        // conn_ids past 31 never get notifications.
        1u32.checked_shl(u32::from(conn_id)).unwrap_or(0)
    }

    /// Apply a CCCD write from `conn_id`.
    pub fn set(&self, conn_id: u16, enabled: bool) {
        let bit = Self::bit(conn_id);
        if enabled {
            self.0.fetch_or(bit, core::sync::atomic::Ordering::Relaxed);
        } else {
            self.0.fetch_and(!bit, core::sync::atomic::Ordering::Relaxed);
        }
    }

    pub fn enabled(&self, conn_id: u16) -> bool {
        let bit = Self::bit(conn_id);
        bit != 0 && self.0.load(core::sync::atomic::Ordering::Relaxed) & bit != 0
    }
}

impl Default for NotifySubscriptions {
    fn default() -> Self {
        Self::new()
    }
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU16 = AtomicU16::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
/// Attribute handles, indexed by [`ControlPoint::index`].
#[cfg(target_os = "espidf")]
static BLE_CHAR_HANDLES: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];
#[cfg(target_os = "espidf")]
static BLE_CCCD_HANDLE: AtomicU16 = AtomicU16::new(0);
#[cfg(target_os = "espidf")]
static BLE_NOTIFY: NotifySubscriptions = NotifySubscriptions::new();
#[cfg(target_os = "espidf")]
static BLE_SERVICE_READY: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_ADV_DATA_READY: AtomicBool = AtomicBool::new(false);

// Read cache bridging the run loop → GATTS read callback.
// GATTS callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.
#[cfg(target_os = "espidf")]
static BLE_READ_CACHE: std::sync::Mutex<[CharValue; 3]> =
    std::sync::Mutex::new([CharValue::new(), CharValue::new(), CharValue::new()]);

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn point_for_handle(handle: u16) -> Option<ControlPoint> {
    if handle == 0 {
        return None;
    }
    ControlPoint::ALL
        .into_iter()
        .find(|p| BLE_CHAR_HANDLES[p.index()].load(AtomicOrdering::Relaxed) == handle)
}

#[cfg(target_os = "espidf")]
fn gatts_if() -> u8 {
    BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as u8
}

/// Every characteristic is read/write; the application answers both.
#[cfg(target_os = "espidf")]
unsafe fn add_gatt_char(svc_handle: u16, point: ControlPoint) {
    use esp_idf_svc::sys::*;
    let mut uuid = uuid128_to_esp(char_uuid(point));
    let mut prop = ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_WRITE;
    if point == ControlPoint::ControlCommand {
        prop |= ESP_GATT_CHAR_PROP_BIT_NOTIFY;
    }
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_RSP_BY_APP as u8,
    };
    let ret = unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut uuid,
            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            &mut control,
        )
    };
    if ret != ESP_OK {
        error!("BLE GATTS: add_char {} failed ({})", point.name(), ret);
    }
}

/// CCCD on the control characteristic; the stack stores its value.
#[cfg(target_os = "espidf")]
unsafe fn add_cccd(svc_handle: u16) {
    use esp_idf_svc::sys::*;
    let mut uuid = uuid16_to_esp(CCCD_UUID);
    let mut initial = [0u8; 2];
    let mut value = esp_attr_value_t {
        attr_max_len: 2,
        attr_len: 2,
        attr_value: initial.as_mut_ptr(),
    };
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_AUTO_RSP as u8,
    };
    let ret = unsafe {
        esp_ble_gatts_add_char_descr(
            svc_handle,
            &mut uuid,
            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
            &mut value,
            &mut control,
        )
    };
    if ret != ESP_OK {
        error!("BLE GATTS: add CCCD failed ({})", ret);
    }
}

/// Reply to a request directly from the callback.
#[cfg(target_os = "espidf")]
unsafe fn send_response(conn_id: u16, trans_id: u32, handle: u16, status: u8, value: &[u8]) {
    use esp_idf_svc::sys::*;
    let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
    unsafe {
        rsp.attr_value.handle = handle;
        rsp.attr_value.len = value.len() as u16;
        rsp.attr_value.value[..value.len()].copy_from_slice(value);
        esp_ble_gatts_send_response(
            gatts_if(),
            conn_id,
            trans_id,
            status as esp_gatt_status_t,
            &mut rsp,
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            BLE_ADV_DATA_READY.store(true, AtomicOrdering::Release);
            log::info!("BLE GAP: advertising data set");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("BLE GAP: advertising started");
            } else {
                log::warn!("BLE GAP: advertising start failed ({})", status);
                crate::events::push_event(
                    &crate::events::TRANSPORT_EVENTS,
                    crate::events::TransportEvent::AdvertisingStopped,
                );
            }
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::{TRANSPORT_EVENTS, TransportEvent, push_event};
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // 1 service + 3 × (decl + value) + CCCD
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(svc_handle, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            unsafe { esp_ble_gatts_start_service(svc_handle) };
            BLE_CHAR_STEP.store(0, AtomicOrdering::Relaxed);
            unsafe { add_gatt_char(svc_handle, ControlPoint::ALL[0]) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            let step = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize;
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed);
            let Some(point) = ControlPoint::ALL.get(step).copied() else {
                return;
            };
            BLE_CHAR_HANDLES[point.index()].store(handle, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: {} char (handle={})", point.name(), handle);
            BLE_CHAR_STEP.store(step as u32 + 1, AtomicOrdering::Relaxed);
            match ControlPoint::ALL.get(step + 1) {
                Some(&next) => unsafe { add_gatt_char(svc_handle, next) },
                // The control characteristic is last; its CCCD follows it.
                None => unsafe { add_cccd(svc_handle) },
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let handle = unsafe { (*param).add_char_descr.attr_handle };
            BLE_CCCD_HANDLE.store(handle, AtomicOrdering::Relaxed);
            BLE_SERVICE_READY.store(true, AtomicOrdering::Release);
            log::info!("BLE GATTS: CCCD (handle={}), service ready", handle);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let conn_id = unsafe { (*param).connect.conn_id };
            log::info!("BLE GATTS: client connected (conn_id={})", conn_id);
            push_event(&TRANSPORT_EVENTS, TransportEvent::Connected(PeerHandle(conn_id)));
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            let p = unsafe { &(*param).disconnect };
            BLE_NOTIFY.set(p.conn_id, false);
            log::info!(
                "BLE GATTS: client disconnected (conn_id={}, reason=0x{:02X})",
                p.conn_id,
                p.reason
            );
            push_event(
                &TRANSPORT_EVENTS,
                TransportEvent::Disconnected(PeerHandle(p.conn_id)),
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => {
            let p = unsafe { &(*param).read };
            if !p.need_rsp {
                return;
            }
            let Some(point) = point_for_handle(p.handle) else {
                return;
            };
            let value = BLE_READ_CACHE
                .lock()
                .map(|cache| cache[point.index()].clone())
                .unwrap_or_default();
            let offset = usize::from(p.offset);
            if offset > value.len() {
                unsafe {
                    send_response(
                        p.conn_id,
                        p.trans_id,
                        p.handle,
                        esp_gatt_status_t_ESP_GATT_INVALID_OFFSET as u8,
                        &[],
                    )
                };
            } else {
                unsafe {
                    send_response(
                        p.conn_id,
                        p.trans_id,
                        p.handle,
                        ProtocolStatus::Success.code(),
                        &value[offset..],
                    )
                };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if p.handle == BLE_CCCD_HANDLE.load(AtomicOrdering::Relaxed) {
                let data = unsafe { core::slice::from_raw_parts(p.value, usize::from(p.len)) };
                let enabled = data.first().is_some_and(|b| b & 0x01 != 0);
                BLE_NOTIFY.set(p.conn_id, enabled);
                return;
            }
            let Some(point) = point_for_handle(p.handle) else {
                return;
            };
            if p.is_prep {
                // Long writes are never valid for these characteristics.
                if p.need_rsp {
                    unsafe {
                        send_response(
                            p.conn_id,
                            p.trans_id,
                            p.handle,
                            esp_gatt_status_t_ESP_GATT_REQ_NOT_SUPPORTED as u8,
                            &[],
                        )
                    };
                }
                return;
            }
            let data = unsafe { core::slice::from_raw_parts(p.value, usize::from(p.len)) };
            let mut request = WriteRequest::new(PeerHandle(p.conn_id), point, p.trans_id, data);
            request.need_rsp = p.need_rsp;
            if !push_event(&TRANSPORT_EVENTS, TransportEvent::Write(request)) && p.need_rsp {
                unsafe {
                    send_response(
                        p.conn_id,
                        p.trans_id,
                        p.handle,
                        esp_gatt_status_t_ESP_GATT_NO_RESOURCES as u8,
                        &[],
                    )
                };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_EXEC_WRITE_EVT => {
            let p = unsafe { &(*param).exec_write };
            unsafe {
                send_response(
                    p.conn_id,
                    p.trans_id,
                    0,
                    esp_gatt_status_t_ESP_GATT_REQ_NOT_SUPPORTED as u8,
                    &[],
                )
            };
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    device_name: heapless::String<24>,
    adv_payload: AdvPayload,
    /// Simulation: read cache, indexed by [`ControlPoint::index`].
    #[cfg(not(target_os = "espidf"))]
    values: [CharValue; 3],
    /// Simulation: every status handed to `respond`, with its transaction id.
    #[cfg(not(target_os = "espidf"))]
    pub responses: Vec<(u32, ProtocolStatus)>,
    /// Simulation: every notification sent.
    #[cfg(not(target_os = "espidf"))]
    pub notifications: Vec<(PeerHandle, ControlPoint, CharValue)>,
    /// Simulation: peers dropped through `disconnect`.
    #[cfg(not(target_os = "espidf"))]
    pub dropped: Vec<PeerHandle>,
    #[cfg(not(target_os = "espidf"))]
    advertising_starts: u32,
}

impl BleAdapter {
    /// Bring up the controller and Bluedroid, then register the service.
    ///
    /// Registration finishes asynchronously; [`start_advertising`]
    /// reports [`AdvertisingError::StackNotReady`] until it has.
    ///
    /// [`start_advertising`]: AdvertisingPort::start_advertising
    pub fn init(device_name: heapless::String<24>) -> Result<Self, Error> {
        let adv_payload = advertising_payload(&device_name);
        let adapter = Self {
            device_name,
            adv_payload,
            #[cfg(not(target_os = "espidf"))]
            values: Default::default(),
            #[cfg(not(target_os = "espidf"))]
            responses: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            notifications: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            dropped: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            advertising_starts: 0,
        };
        adapter.platform_init()?;
        info!(
            "BLE: service {:032x} registered as '{}'",
            SERVICE_UUID, adapter.device_name
        );
        Ok(adapter)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn adv_payload(&self) -> &[u8] {
        &self.adv_payload
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&self) -> Result<(), Error> {
        use esp_idf_svc::sys::*;

        fn check(ret: esp_err_t, what: &'static str) -> Result<(), Error> {
            if ret == ESP_OK {
                Ok(())
            } else {
                error!("BLE: {} failed ({})", what, ret);
                Err(Error::Init(what))
            }
        }

        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check(esp_bt_controller_init(&mut bt_cfg), "bt_controller_init")?;
            check(
                esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE),
                "bt_controller_enable",
            )?;
            check(esp_bluedroid_init(), "bluedroid_init")?;
            check(esp_bluedroid_enable(), "bluedroid_enable")?;

            check(
                esp_ble_gap_register_callback(Some(ble_gap_event_handler)),
                "gap_register_callback",
            )?;
            check(
                esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)),
                "gatts_register_callback",
            )?;
            check(esp_ble_gatts_app_register(0), "gatts_app_register")?;

            // NUL-terminated copy for the C API.
            let mut cname = heapless::Vec::<u8, 25>::new();
            let _ = cname.extend_from_slice(self.device_name.as_bytes());
            let _ = cname.push(0);
            check(
                esp_ble_gap_set_device_name(cname.as_ptr() as *const _),
                "gap_set_device_name",
            )?;

            let mut adv = self.adv_payload.clone();
            check(
                esp_ble_gap_config_adv_data_raw(adv.as_mut_ptr(), adv.len() as u32),
                "gap_config_adv_data_raw",
            )?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&self) -> Result<(), Error> {
        info!("BLE(sim): stack initialised");
        Ok(())
    }

    /// Simulation: the value a read of `point` would return.
    #[cfg(not(target_os = "espidf"))]
    pub fn value(&self, point: ControlPoint) -> &[u8] {
        &self.values[point.index()]
    }

    /// Simulation: how often advertising was (re)started.
    #[cfg(not(target_os = "espidf"))]
    pub fn advertising_starts(&self) -> u32 {
        self.advertising_starts
    }
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl AdvertisingPort for BleAdapter {
    #[cfg(target_os = "espidf")]
    fn start_advertising(&mut self) -> Result<(), AdvertisingError> {
        use esp_idf_svc::sys::*;
        if !BLE_SERVICE_READY.load(AtomicOrdering::Acquire)
            || !BLE_ADV_DATA_READY.load(AtomicOrdering::Acquire)
        {
            return Err(AdvertisingError::StackNotReady);
        }
        let interval = adv_interval_units(ADV_INTERVAL_MS);
        let mut adv_params = esp_ble_adv_params_t {
            adv_int_min: interval,
            adv_int_max: interval,
            adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            ..unsafe { core::mem::zeroed() }
        };
        let ret = unsafe { esp_ble_gap_start_advertising(&mut adv_params) };
        if ret != ESP_OK {
            return Err(AdvertisingError::Rejected(ret));
        }
        info!("BLE: advertising as '{}'", self.device_name);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn start_advertising(&mut self) -> Result<(), AdvertisingError> {
        self.advertising_starts += 1;
        info!(
            "BLE(sim): advertising '{}' every {} ms (interval {} units)",
            self.device_name,
            ADV_INTERVAL_MS,
            adv_interval_units(ADV_INTERVAL_MS)
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn disconnect(&mut self, peer: PeerHandle) {
        let ret = unsafe { esp_idf_svc::sys::esp_ble_gatts_close(gatts_if(), peer.0) };
        if ret != esp_idf_svc::sys::ESP_OK {
            warn!("BLE: could not drop peer {} ({})", peer.0, ret);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn disconnect(&mut self, peer: PeerHandle) {
        info!("BLE(sim): dropping peer {}", peer.0);
        self.dropped.push(peer);
    }
}

impl ResponderPort for BleAdapter {
    #[cfg(target_os = "espidf")]
    fn respond(&mut self, request: &WriteRequest, status: ProtocolStatus) {
        let handle = BLE_CHAR_HANDLES[request.point.index()].load(AtomicOrdering::Relaxed);
        unsafe {
            send_response(
                request.peer.0,
                request.trans_id,
                handle,
                status.code(),
                &[],
            )
        };
    }

    #[cfg(not(target_os = "espidf"))]
    fn respond(&mut self, request: &WriteRequest, status: ProtocolStatus) {
        self.responses.push((request.trans_id, status));
    }

    #[cfg(target_os = "espidf")]
    fn set_value(&mut self, point: ControlPoint, value: &[u8]) {
        if let Ok(mut cache) = BLE_READ_CACHE.lock() {
            cache[point.index()] = char_value(value);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_value(&mut self, point: ControlPoint, value: &[u8]) {
        self.values[point.index()] = char_value(value);
    }

    #[cfg(target_os = "espidf")]
    fn notify(&mut self, peer: PeerHandle, point: ControlPoint, value: &[u8]) {
        if !BLE_NOTIFY.enabled(peer.0) {
            return;
        }
        let handle = BLE_CHAR_HANDLES[point.index()].load(AtomicOrdering::Relaxed);
        let mut buf = char_value(value);
        let ret = unsafe {
            esp_idf_svc::sys::esp_ble_gatts_send_indicate(
                gatts_if(),
                peer.0,
                handle,
                buf.len() as u16,
                buf.as_mut_ptr(),
                false,
            )
        };
        if ret != esp_idf_svc::sys::ESP_OK {
            warn!("BLE: notify on {} failed ({})", point.name(), ret);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn notify(&mut self, peer: PeerHandle, point: ControlPoint, value: &[u8]) {
        self.notifications.push((peer, point, char_value(value)));
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
