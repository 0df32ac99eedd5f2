//! Fuzz target: `decode_write`
//!
//! The first byte picks the control point; the rest is the payload.
//! Decoding must never panic, and anything accepted must be a request
//! the point actually carries.
//!
//! cargo fuzz run fuzz_write_decoder

#![no_main]

use growlight::protocol::{ControlPoint, Request, decode_write};
use growlight::recipes::RecipeId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let point = ControlPoint::ALL[usize::from(selector) % ControlPoint::ALL.len()];

    match (point, decode_write(point, payload)) {
        (ControlPoint::RecipeSelect, Ok(Request::SelectRecipe(code))) => {
            assert_eq!(payload, [code]);
            // Unknown codes must be rejected by the table, not accepted.
            if let Ok(id) = RecipeId::from_code(code) {
                assert_eq!(id.code(), code);
            }
        }
        (ControlPoint::CustomColor, Ok(Request::CustomColor(c))) => {
            assert_eq!(payload, c.to_bytes());
        }
        (ControlPoint::ControlCommand, Ok(Request::Command(cmd))) => {
            assert_eq!(payload.first(), Some(&cmd.opcode()));
        }
        (_, Ok(other)) => panic!("{:?} decoded as {:?}", point, other),
        (_, Err(_)) => {}
    }
});
