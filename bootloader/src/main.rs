// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]
#![no_main]
mod consts;
mod hw;
mod jump_app;
mod status;

use defmt_rtt as _;
// global logger
use panic_probe as _;

use crate::consts::{LAYOUT, PAGE};
use crate::hw::{Cortex, HwCrc};
use crate::status::OptionByteStatus;
use cortex_m_rt::entry;
use defmt::{error, info, warn};
use embassy_stm32::crc::Crc;
use embassy_stm32::flash::Flash;
use jump_app::jump_to_app;
use upgrade::{Outcome, StatusStore, Updater, VectorTable};

#[entry]
fn main() -> ! {
    let p = embassy_stm32::init(Default::default());

    info!("Bootloader v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "application {=u32:#x}..{=u32:#x}, backup {=u32:#x}..{=u32:#x}",
        LAYOUT.application().start(),
        LAYOUT.application().end(),
        LAYOUT.backup().start(),
        LAYOUT.backup().end()
    );

    let flash = Flash::new_blocking(p.FLASH);
    let crc = HwCrc::new(Crc::new(p.CRC));
    let mut store = OptionByteStatus::new();
    info!("update status {=u8:#x}", store.read());

    let mut updater = match Updater::<_, _, _, _, PAGE>::new(flash, store, crc, Cortex, LAYOUT) {
        Ok(updater) => updater,
        Err(e) => {
            error!("bootloader misconfigured: {}", e);
            Cortex::halt()
        }
    };

    match updater.run() {
        Outcome::Launch => {
            let (mut flash, _, _, _) = updater.release();
            let image_base = LAYOUT.application().start();
            match VectorTable::read(&mut flash, LAYOUT.flash_base(), image_base) {
                Ok(table) => unsafe { jump_to_app(image_base, table) },
                Err(_) => {
                    error!("unable to read the application vector table");
                    Cortex::halt()
                }
            }
        }
        Outcome::Reset(status) => {
            // The new status only becomes visible once the option bytes are reloaded.
            info!("status {} persisted, resetting", status);
            Cortex::reset()
        }
        Outcome::Halt(fault) => {
            error!("halted: {}", fault);
            warn!("application region is not trusted, waiting for external recovery");
            Cortex::halt()
        }
    }
}
