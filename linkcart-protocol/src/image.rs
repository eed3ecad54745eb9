//! Cartridge image layout.

use crate::rom::{RomSlot, Slot};

/// Size of the cartridge image
pub const IMAGE_SIZE: usize = 64 * 1024;

/// Value of every byte not covered by a ROM
pub const FILL_BYTE: u8 = 0xFF;

/// Bytes sent per acknowledged chunk
pub const CHUNK_SIZE: usize = 32;

/// Number of chunks in a full image
pub const CHUNK_COUNT: usize = IMAGE_SIZE / CHUNK_SIZE;

/// The 64KB memory map sent to the cartridge. Always exactly `IMAGE_SIZE` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RomImage {
    bytes: Box<[u8]>,
}

impl RomImage {
    /// Lay out up to two ROMs into a fresh image
    pub fn build(slot1: Option<&RomSlot>, slot2: Option<&RomSlot>) -> Self {
        let mut image = RomImage {
            bytes: vec![FILL_BYTE; IMAGE_SIZE].into_boxed_slice(),
        };
        if let Some(rom) = slot1 {
            image.place(Slot::First, rom);
        }
        if let Some(rom) = slot2 {
            image.place(Slot::Second, rom);
        }
        image
    }

    fn place(&mut self, slot: Slot, rom: &RomSlot) {
        let (first_at, second_at) = slot.offsets();
        for (at, half) in [(first_at, rom.first_half()), (second_at, rom.second_half())] {
            self.bytes[at..at + half.len()].copy_from_slice(half);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload split into the 32-byte units the device acknowledges
    pub fn chunks(&self) -> std::slice::Chunks<'_, u8> {
        self.bytes.chunks(CHUNK_SIZE)
    }
}

impl std::fmt::Debug for RomImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.bytes.iter().filter(|&&b| b != FILL_BYTE).count();
        write!(f, "RomImage({} bytes, {} non-fill)", self.bytes.len(), used)
    }
}
