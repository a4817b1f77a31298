//! Zellij plugin entry point.
//!
//! The plugin only exists on the WASM target; everything it drives lives in
//! the `bolsas_queue` library, which builds and tests natively.

#![allow(clippy::multiple_crate_versions)]

#[cfg(target_family = "wasm")]
mod plugin;

#[cfg(target_family = "wasm")]
use zellij_tile::prelude::*;

#[cfg(target_family = "wasm")]
register_plugin!(plugin::State);

#[cfg(not(target_family = "wasm"))]
fn main() {
    eprintln!("bolsas-queue is a Zellij plugin; build it with --target wasm32-wasip1 and load the .wasm from a layout");
}
