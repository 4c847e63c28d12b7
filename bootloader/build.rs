// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! This build script renders `memory.x` from the partition constants and puts
//! it in a directory where the linker can always find it at build time.
//! The bootloader only gets its own region: the application, the backup copy
//! and the parameter pages are never linked into this binary.

use consts::{BOOTLOADER_SIZE, FLASH_BASE, RAM_BASE, RAM_SIZE};
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    let memory_x_content = format!(
        r##"
        MEMORY
        {{
            /* NOTE 1 K = 1 KiBi = 1024 bytes */
            /* The bootloader flash partition is the first {boot}K of flash */
            FLASH (rx) : ORIGIN = {flash:#X}, LENGTH = {boot}K
            RAM (rwx) : ORIGIN = {ram:#X}, LENGTH = {ram_size}K
        }}
        "##,
        flash = FLASH_BASE,
        boot = BOOTLOADER_SIZE / 1024,
        ram = RAM_BASE,
        ram_size = RAM_SIZE / 1024,
    );
    // Put `memory.x` in our output directory and ensure it's
    // on the linker search path.
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(memory_x_content.as_bytes())
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());

    // The layout lives in the consts crate, rebuild whenever it changes.
    println!("cargo:rerun-if-changed=../consts/src/lib.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
