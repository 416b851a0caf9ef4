//! WASM bindings for the plume editor modules.
//!
//! Each module is an exported class constructed from a `DocumentPortAdapter`
//! (the host's rich-text engine), the editing surface element and an options
//! bag. Every class has a `destroy()` that reverses all of its side effects.

mod modules;
mod port;
mod source;
mod types;

pub use modules::*;
pub use port::*;
pub use source::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and the console tracing layer.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}
