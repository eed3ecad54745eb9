//! ROM slot inputs and their display names.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::RomError;

/// Largest ROM a slot accepts
pub const SLOT_SIZE: usize = 32 * 1024;

/// Each slot is mapped into the image as two halves of this size
pub const HALF_SIZE: usize = 16 * 1024;

/// Names are cut to this many characters when taken from a file
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

/// Names are cut to this many bytes before they go on the wire
pub const MAX_WIRE_NAME_LEN: usize = 28;

/// One of the two cartridge slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    /// Image offsets of the (first half, second half) of this slot's ROM
    pub fn offsets(self) -> (usize, usize) {
        match self {
            Slot::First => (0x4000, 0x0000),
            Slot::Second => (0xC000, 0x8000),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Slot::First => 1,
            Slot::Second => 2,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.number())
    }
}

/// ROM contents for one slot, at most `SLOT_SIZE` bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomSlot {
    data: Vec<u8>,
}

impl RomSlot {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RomError> {
        if data.len() > SLOT_SIZE {
            return Err(RomError::InputTooLarge {
                len: data.len() as u64,
                max: SLOT_SIZE,
            });
        }
        Ok(RomSlot { data })
    }

    /// Load a ROM file, rejecting oversized files before reading them
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let path = path.as_ref();
        let io_err = |source| RomError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        if len > SLOT_SIZE as u64 {
            return Err(RomError::InputTooLarge {
                len,
                max: SLOT_SIZE,
            });
        }

        let mut data = Vec::with_capacity(len as usize);
        file.read_to_end(&mut data).map_err(io_err)?;
        Self::from_bytes(data)
    }

    /// Bytes mapped at the slot's first offset
    pub fn first_half(&self) -> &[u8] {
        &self.data[..self.data.len().min(HALF_SIZE)]
    }

    /// Bytes past the first 16KB, possibly empty
    pub fn second_half(&self) -> &[u8] {
        &self.data[self.data.len().min(HALF_SIZE)..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Display name of a slot, shown on the cartridge menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomName(String);

impl RomName {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        RomName(name.as_ref().chars().take(MAX_DISPLAY_NAME_CHARS).collect())
    }

    /// Name from a file path: the file stem without extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let stem = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes sent to the device: at most 28 bytes, never empty.
    ///
    /// Truncation backs off to a char boundary so the field stays valid UTF-8.
    pub fn wire_bytes(&self) -> Vec<u8> {
        if self.0.is_empty() {
            return vec![b' '];
        }
        let mut end = self.0.len().min(MAX_WIRE_NAME_LEN);
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }
        self.0.as_bytes()[..end].to_vec()
    }
}

impl std::fmt::Display for RomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_rejects_oversized_buffer() {
        assert!(RomSlot::from_bytes(vec![0; SLOT_SIZE]).is_ok());
        match RomSlot::from_bytes(vec![0; SLOT_SIZE + 1]) {
            Err(RomError::InputTooLarge { len, max }) => {
                assert_eq!(len, SLOT_SIZE as u64 + 1);
                assert_eq!(max, SLOT_SIZE);
            }
            other => panic!("expected InputTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_slot_halves() {
        let slot = RomSlot::from_bytes(vec![0xAA; 24576]).unwrap();
        assert_eq!(slot.first_half().len(), HALF_SIZE);
        assert_eq!(slot.second_half().len(), 8192);

        let small = RomSlot::from_bytes(vec![1; 100]).unwrap();
        assert_eq!(small.first_half().len(), 100);
        assert!(small.second_half().is_empty());

        let empty = RomSlot::from_bytes(vec![]).unwrap();
        assert!(empty.first_half().is_empty());
        assert!(empty.second_half().is_empty());
    }

    #[test]
    fn test_slot_from_file() {
        let dir = std::env::temp_dir();
        let ok_path = dir.join("linkcart-test-ok.rom");
        let big_path = dir.join("linkcart-test-big.rom");
        std::fs::write(&ok_path, vec![0x3E; 1000]).unwrap();
        std::fs::write(&big_path, vec![0; SLOT_SIZE + 16]).unwrap();

        let slot = RomSlot::from_file(&ok_path).unwrap();
        assert_eq!(slot.len(), 1000);
        assert!(matches!(
            RomSlot::from_file(&big_path),
            Err(RomError::InputTooLarge { .. })
        ));
        assert!(matches!(
            RomSlot::from_file(dir.join("linkcart-test-missing.rom")),
            Err(RomError::Io { .. })
        ));

        let _ = std::fs::remove_file(ok_path);
        let _ = std::fs::remove_file(big_path);
    }

    #[test]
    fn test_name_from_path_uses_stem() {
        assert_eq!(RomName::from_path("/roms/Nemesis 2.rom").as_str(), "Nemesis 2");
        let long = format!("{}.bin", "x".repeat(40));
        assert_eq!(RomName::from_path(long).as_str().len(), MAX_DISPLAY_NAME_CHARS);
    }

    #[test]
    fn test_wire_name_truncated_to_28_bytes() {
        let name = RomName::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123");
        assert_eq!(name.wire_bytes(), b"ABCDEFGHIJKLMNOPQRSTUVWXYZ01".to_vec());
    }

    #[test]
    fn test_empty_name_sent_as_space() {
        assert_eq!(RomName::new("").wire_bytes(), vec![b' ']);
        assert_eq!(RomName::default().wire_bytes(), vec![b' ']);
    }

    #[test]
    fn test_wire_name_keeps_utf8_valid() {
        // 10 three-byte chars: byte 28 falls inside the tenth char
        let name = RomName::new("魂".repeat(10));
        let bytes = name.wire_bytes();
        assert_eq!(bytes.len(), 27);
        assert!(std::str::from_utf8(&bytes).is_ok());
    }
}
