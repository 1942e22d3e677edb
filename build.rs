//! Puts the RP2350 memory layout on the linker search path as `memory.x`.
//!
//! Only the firmware binary links with `-Tlink.x`; host builds of the library
//! ignore the copied script.

use std::env;
use std::fs;
use std::path::PathBuf;

const MEMORY_SCRIPT: &str = "rp2350.x";

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    fs::copy(MEMORY_SCRIPT, out_dir.join("memory.x"))
        .unwrap_or_else(|e| panic!("copying {MEMORY_SCRIPT} to memory.x: {e}"));

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed={MEMORY_SCRIPT}");
    println!("cargo:rerun-if-changed=build.rs");
}
