//! JavaScript bindings for the pendulum core.
//!
//! A front-end owns one `WasmPendulum` per on-screen pendulum, feeds it frame
//! times and reads back angles, bob positions and energy. Drawing stays on the
//! JS side.

mod analysis;
mod system;

pub use system::WasmPendulum;

use std::sync::Once;
use wasm_bindgen::prelude::*;

static LOGGING: Once = Once::new();

/// Installs the panic hook and, on wasm32, routes `tracing` output to the browser console.
/// Safe to call more than once.
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    LOGGING.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        tracing_wasm::set_as_global_default();
    });
}
