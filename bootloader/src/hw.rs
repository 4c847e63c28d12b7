// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use cortex_m::peripheral::SCB;
use embassy_stm32::crc::Crc;
use upgrade::{Checksum, Core};

/// Word checksum computed by the CRC unit.
pub struct HwCrc<'d> {
    crc: Crc<'d>,
}

impl<'d> HwCrc<'d> {
    pub fn new(crc: Crc<'d>) -> Self {
        Self { crc }
    }
}

impl Checksum for HwCrc<'_> {
    fn reset(&mut self) {
        self.crc.reset();
    }

    fn update(&mut self, words: &[u8]) {
        for word in words.chunks_exact(4) {
            self.crc.feed_word(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
        }
    }

    fn finish(&mut self) -> u32 {
        self.crc.read()
    }
}

/// The Cortex-M3 core running the bootloader.
pub struct Cortex;

impl Cortex {
    /// System reset, also reloads the option bytes.
    pub fn reset() -> ! {
        SCB::sys_reset()
    }

    /// Park the core until an external reset.
    pub fn halt() -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}

impl Core for Cortex {
    fn mask_exceptions(&mut self) {
        cortex_m::interrupt::disable();
        // FAULTMASK: HardFault and friends are masked as well.
        unsafe { core::arch::asm!("cpsid f", options(nomem, nostack, preserves_flags)) };
    }
}
