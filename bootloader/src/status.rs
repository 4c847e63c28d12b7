// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use consts::{OB_DATA0_OFFSET, OB_DATA1_OFFSET, OB_RDP_OFFSET, OB_USER_OFFSET, OB_WRP0_OFFSET, OPTION_BYTES_BASE, RDP_UNPROTECTED};
use defmt::{info, Format};
use stm32f1::stm32f103::{flash::RegisterBlock, FLASH};
use upgrade::{Status, StatusStore};

/// Unlock sequence shared by FLASH_KEYR and FLASH_OPTKEYR.
const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

const CR_OPTPG: u32 = 1 << 4;
const CR_OPTER: u32 = 1 << 5;
const CR_STRT: u32 = 1 << 6;
const CR_LOCK: u32 = 1 << 7;
const CR_OPTWRE: u32 = 1 << 9;

const SR_BSY: u32 = 1 << 0;
const SR_PGERR: u32 = 1 << 2;
const SR_WRPRTERR: u32 = 1 << 4;
const SR_EOP: u32 = 1 << 5;

const OBR_RDPRT: u32 = 1 << 1;
const OBR_USER_SHIFT: u32 = 2;
const OBR_DATA0_SHIFT: u32 = 10;
const OBR_DATA1_SHIFT: u32 = 18;

#[derive(Debug, Format)]
pub enum OptionByteError {
    /// The option byte write enable was not granted.
    Locked,
    /// The flash interface reported an error while erasing the option bytes.
    Erase,
    /// The flash interface reported an error while programming an option byte.
    Program { offset: u32 },
}

/// Update status kept in the DATA0 user option byte.
///
/// FLASH_OBR is only loaded at reset, a persisted value is visible after the
/// next reset and reads return the value of the current boot until then.
#[derive(Default)]
pub struct OptionByteStatus {
    _private: (),
}

impl OptionByteStatus {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn flash() -> &'static RegisterBlock {
        unsafe { &*FLASH::ptr() }
    }
}

impl StatusStore for OptionByteStatus {
    type Error = OptionByteError;

    fn read(&mut self) -> u8 {
        (Self::flash().obr.read().bits() >> OBR_DATA0_SHIFT) as u8
    }

    /// Rewrite the option bytes with DATA0 set to `status`.
    ///
    /// Option bytes are erased as a block, so every other option byte is read
    /// back first and restored afterwards.
    fn persist(&mut self, status: Status) -> Result<(), Self::Error> {
        let flash = Self::flash();
        let obr = flash.obr.read().bits();
        let wrp = flash.wrpr.read().bits();
        let rdp = if obr & OBR_RDPRT != 0 { 0x00 } else { RDP_UNPROTECTED };
        let user = (obr >> OBR_USER_SHIFT) as u8;
        let data1 = (obr >> OBR_DATA1_SHIFT) as u8;

        info!("persisting status {} in option bytes", status);

        unlock(flash);
        let result = if flash.cr.read().bits() & CR_OPTWRE == 0 {
            Err(OptionByteError::Locked)
        } else {
            rewrite(flash, rdp, user, status.as_byte(), data1, wrp)
        };
        lock(flash);
        result
    }
}

fn unlock(flash: &RegisterBlock) {
    if flash.cr.read().bits() & CR_LOCK != 0 {
        flash.keyr.write(|w| unsafe { w.bits(KEY1) });
        flash.keyr.write(|w| unsafe { w.bits(KEY2) });
    }
    flash.optkeyr.write(|w| unsafe { w.bits(KEY1) });
    flash.optkeyr.write(|w| unsafe { w.bits(KEY2) });
}

fn lock(flash: &RegisterBlock) {
    flash
        .cr
        .modify(|r, w| unsafe { w.bits((r.bits() & !CR_OPTWRE) | CR_LOCK) });
}

/// Wait for the flash interface and clear the end of operation and error flags.
fn wait_ready(flash: &RegisterBlock) -> bool {
    while flash.sr.read().bits() & SR_BSY != 0 {}
    let sr = flash.sr.read().bits();
    flash
        .sr
        .write(|w| unsafe { w.bits(SR_EOP | SR_PGERR | SR_WRPRTERR) });
    sr & (SR_PGERR | SR_WRPRTERR) == 0
}

fn rewrite(flash: &RegisterBlock, rdp: u8, user: u8, data0: u8, data1: u8, wrp: u32) -> Result<(), OptionByteError> {
    wait_ready(flash);

    flash.cr.modify(|r, w| unsafe { w.bits(r.bits() | CR_OPTER) });
    flash.cr.modify(|r, w| unsafe { w.bits(r.bits() | CR_STRT) });
    let erased = wait_ready(flash);
    flash.cr.modify(|r, w| unsafe { w.bits(r.bits() & !CR_OPTER) });
    if !erased {
        return Err(OptionByteError::Erase);
    }

    // Erased option bytes read as 0xFF, only the others need programming.
    // RDP is always written back or the part would come up read protected.
    let wrp = wrp.to_le_bytes();
    let bytes = [
        (OB_RDP_OFFSET, rdp),
        (OB_USER_OFFSET, user),
        (OB_DATA0_OFFSET, data0),
        (OB_DATA1_OFFSET, data1),
        (OB_WRP0_OFFSET, wrp[0]),
        (OB_WRP0_OFFSET + 2, wrp[1]),
        (OB_WRP0_OFFSET + 4, wrp[2]),
        (OB_WRP0_OFFSET + 6, wrp[3]),
    ];

    flash.cr.modify(|r, w| unsafe { w.bits(r.bits() | CR_OPTPG) });
    let mut result = Ok(());
    for (offset, value) in bytes {
        if value == 0xFF && offset != OB_RDP_OFFSET {
            continue;
        }
        // The complement in the high byte is generated by the flash interface.
        unsafe { core::ptr::write_volatile((OPTION_BYTES_BASE + offset) as *mut u16, value as u16) };
        if !wait_ready(flash) {
            result = Err(OptionByteError::Program { offset });
            break;
        }
    }
    flash.cr.modify(|r, w| unsafe { w.bits(r.bits() & !CR_OPTPG) });
    result
}
