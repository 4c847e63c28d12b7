// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use consts::{BOOTLOADER_SIZE, FLASH_BASE, FLASH_PAGE_SIZE, FLASH_SIZE, PARAMETER_SIZE};
use upgrade::Layout;

/// Partition table of the target flash.
/// Evaluated at compile time, an inconsistent set of sizes fails the build.
pub const LAYOUT: Layout = Layout::new(FLASH_BASE, FLASH_SIZE, BOOTLOADER_SIZE, FLASH_PAGE_SIZE, PARAMETER_SIZE);

/// Size of the scratch page used while copying the staged image.
pub const PAGE: usize = FLASH_PAGE_SIZE as usize;

// The linker gives the bootloader exactly its region, see build.rs.
const _: () = assert!(LAYOUT.bootloader().len() == BOOTLOADER_SIZE);
