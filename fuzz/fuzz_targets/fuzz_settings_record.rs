//! Fuzz target: `StoredSettings::decode`
//!
//! Arbitrary flash contents must decode to a record that re-encodes to
//! the same settings, or fail with a typed error.
//!
//! cargo fuzz run fuzz_settings_record

#![no_main]

use growlight::adapters::nvs::{RECORD_VERSION, StoredSettings};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(record) = StoredSettings::decode(data) else {
        return;
    };
    assert_eq!(record.version, RECORD_VERSION);

    let bytes = record.encode().expect("decoded record must encode");
    let again = StoredSettings::decode(&bytes).expect("re-encoded record must decode");
    assert_eq!(again, record);
});
