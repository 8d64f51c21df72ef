// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Configuration storage in the last flash sector.
//!
//! Sector 11 (256 KiB at `0x081C_0000`) is kept out of the firmware image by `memory.x`. A store
//! erases the whole sector and programs the record at its start, so the block is always written
//! whole.

use stm32f7xx_hal::{flash::Flash, pac};

use crate::config::{ConfigStore, RECORD_LEN};

const FLASH_BASE: usize = 0x0800_0000;
const CONFIG_SECTOR: u8 = 11;
const CONFIG_ADDR: usize = 0x081C_0000;

/// Erase or program failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlashFailed;

pub struct FlashStore {
    flash: Flash,
}

impl FlashStore {
    pub fn new(flash: pac::FLASH) -> Self {
        Self {
            flash: Flash::new(flash),
        }
    }
}

impl ConfigStore for FlashStore {
    type Error = FlashFailed;

    fn load(&mut self, buf: &mut [u8; RECORD_LEN]) -> Result<(), FlashFailed> {
        // Memory-mapped, read-only while the sector is not being programmed.
        let stored = unsafe { core::slice::from_raw_parts(CONFIG_ADDR as *const u8, RECORD_LEN) };
        buf.copy_from_slice(stored);
        Ok(())
    }

    fn store(&mut self, buf: &[u8; RECORD_LEN]) -> Result<(), FlashFailed> {
        self.flash.unlock();
        let result = self
            .flash
            .blocking_erase_sector(CONFIG_SECTOR)
            .and_then(|()| self.flash.blocking_program(CONFIG_ADDR - FLASH_BASE, buf));
        self.flash.lock();
        result.map_err(|_| FlashFailed)
    }
}
