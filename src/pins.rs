use crate::protocol::PinMode;

/// Mode and last written value of one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinEntry {
    pub mode: PinMode,
    pub state: u8,
}

/// Per-pin configuration, indexed by pin number. `PINS` is the board's
/// total pin count.
#[derive(Debug, Clone)]
pub struct PinTable<const PINS: usize> {
    entries: [PinEntry; PINS],
}

impl<const PINS: usize> Default for PinTable<PINS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PINS: usize> PinTable<PINS> {
    pub fn new() -> Self {
        PinTable {
            entries: [PinEntry::default(); PINS],
        }
    }

    pub const fn len(&self) -> usize {
        PINS
    }

    pub const fn is_empty(&self) -> bool {
        PINS == 0
    }

    pub fn get(&self, pin: u8) -> Option<&PinEntry> {
        self.entries.get(pin as usize)
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.get(pin).map(|e| e.mode)
    }

    pub fn state(&self, pin: u8) -> Option<u8> {
        self.get(pin).map(|e| e.state)
    }

    /// Stores a new mode and zeroes the pin's state. Returns false, and
    /// changes nothing, for unknown pins and pins marked `Ignore`.
    pub fn set_mode(&mut self, pin: u8, mode: PinMode) -> bool {
        match self.entries.get_mut(pin as usize) {
            Some(entry) if entry.mode != PinMode::Ignore => {
                entry.state = 0;
                entry.mode = mode;
                true
            }
            _ => false,
        }
    }

    pub fn set_state(&mut self, pin: u8, state: u8) {
        match self.entries.get_mut(pin as usize) {
            Some(entry) => entry.state = state,
            None => log::trace!("state for unknown pin {pin} dropped"),
        }
    }

    /// Zero every pin's state. Modes are left alone.
    pub fn reset_states(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.state = 0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinEntry> {
        self.entries.iter()
    }
}
