// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// The vendor ISP core is loaded at runtime through libloading, so nothing is
// linked here. The bindings in src/ffi.rs are maintained by hand against
// ak_isp_drv.h because the SDK header differs between releases.

fn main() {
    println!("cargo:rerun-if-changed=src/ffi.rs");
    println!("cargo:rerun-if-env-changed=AKISP_LIBRARY");
}
