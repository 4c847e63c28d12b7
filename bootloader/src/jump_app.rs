// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later
use cortex_m::peripheral::{NVIC, SCB, SYST};
use defmt::info;
use upgrade::VectorTable;

/// Boots the application whose vector table starts at `image_base`.
///
/// # Safety
///
/// This modifies the stack pointer and vector table offset and will run
/// whatever code is placed at `image_base`. No validation happens here.
pub unsafe fn jump_to_app(image_base: u32, table: VectorTable) -> ! {
    cortex_m::interrupt::disable();

    // Disable and clear every interrupt line, the application sets up its own.
    let nvic = &*NVIC::PTR;
    for (icer, icpr) in nvic.icer.iter().zip(nvic.icpr.iter()) {
        icer.write(u32::MAX);
        icpr.write(u32::MAX);
    }
    (*SYST::PTR).csr.write(0);

    // Rebase the vector table on the application.
    (*SCB::PTR).vtor.write(image_base);
    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    info!(
        "msp = {=u32:x}, rv = {=u32:x}",
        table.stack_pointer, table.reset_vector
    );

    // These instructions perform the following operations:
    //
    // * Modify control register to use MSP as stack pointer (clear spsel bit)
    // * Synchronize instruction barrier
    // * Initialize stack pointer from the application vector table
    // * Set link register to not return (0xFF)
    // * Jump to the application reset vector
    core::arch::asm!(
        "mrs {tmp}, CONTROL",
        "bics {tmp}, {spsel}",
        "msr CONTROL, {tmp}",
        "isb",
        "msr MSP, {msp}",
        "mov lr, {new_lr}",
        "bx {rv}",
        // `out(reg) _` is not permitted in a `noreturn` asm! call,
        // so instead use `in(reg) 0` and don't restore it afterwards.
        tmp = in(reg) 0,
        spsel = in(reg) 2,
        new_lr = in(reg) 0xFFFFFFFFu32,
        msp = in(reg) table.stack_pointer,
        rv = in(reg) table.reset_vector,
        options(noreturn),
    );
}
