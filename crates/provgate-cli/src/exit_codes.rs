//! Process exit codes.
//! Gate errors carry their own code; anything else is a usage or config error.

use provgate_core::GateError;

pub const SUCCESS: i32 = 0;
pub const CONFIG_ERROR: i32 = 1;

pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GateError>())
        .map(GateError::exit_code)
        .unwrap_or(CONFIG_ERROR)
}
