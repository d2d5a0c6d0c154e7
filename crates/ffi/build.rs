//! Generates `P1RadFFI.h` at the workspace root from the exported `p1rad_*` API.

use std::env;
use std::path::PathBuf;

const HEADER_NOTE: &str = "/* C interface to the P1 radiation spectral absorption model.\n \
 * Tables hold 126 samples at 20 K spacing starting from 300 K. */";

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let header = PathBuf::from(&crate_dir).join("../../P1RadFFI.h");

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_header(HEADER_NOTE)
        .with_include_guard("P1RAD_FFI_H")
        .with_documentation(true)
        .with_pragma_once(false)
        .generate()
        .expect("Unable to generate the P1Rad C header")
        .write_to_file(header);

    for source in ["lib.rs", "error.rs", "spectral.rs"] {
        println!("cargo:rerun-if-changed=src/{source}");
    }
}
