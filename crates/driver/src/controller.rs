use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Packed state of a standard controller, one bit per button.
///
/// Bit order is the order the console shifts buttons out of $4016: A first,
/// Right last.
#[derive(Clone, Copy, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct ControllerState(u8);

bitflags! {
    impl ControllerState: u8 {
        const A = 0x1;
        const B = 0x2;
        const SELECT = 0x4;
        const START = 0x8;
        const UP = 0x10;
        const DOWN = 0x20;
        const LEFT = 0x40;
        const RIGHT = 0x80;
    }
}

impl std::fmt::Debug for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ControllerState(")?;
        crate::util::fmt_bitflags_u8(self.bits(), ['r', 'l', 'd', 'u', 't', 's', 'b', 'a'], f)?;
        f.write_str(")")
    }
}

impl ControllerState {
    /// Last-write-wins: pressing a held button or releasing a free one changes nothing.
    pub fn apply(&mut self, event: ButtonEvent) {
        let mask = event.button.mask();
        match event.edge {
            Edge::Press => *self |= mask,
            Edge::Release => *self -= mask,
        }
    }

    pub fn snapshot(&self) -> u8 {
        self.bits()
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.contains(button.mask())
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub enum ButtonId {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl ButtonId {
    pub const ALL: [ButtonId; 8] = [
        ButtonId::A,
        ButtonId::B,
        ButtonId::Select,
        ButtonId::Start,
        ButtonId::Up,
        ButtonId::Down,
        ButtonId::Left,
        ButtonId::Right,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn mask(self) -> ControllerState {
        ControllerState::from_bits_retain(1 << self.index())
    }

    pub fn name(self) -> &'static str {
        match self {
            ButtonId::A => "A",
            ButtonId::B => "B",
            ButtonId::Select => "Select",
            ButtonId::Start => "Start",
            ButtonId::Up => "DPAD up",
            ButtonId::Down => "DPAD down",
            ButtonId::Left => "DPAD left",
            ButtonId::Right => "DPAD right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum Edge {
    Press,
    Release,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub edge: Edge,
}

impl ButtonEvent {
    pub fn press(button: ButtonId) -> Self {
        Self {
            button,
            edge: Edge::Press,
        }
    }

    pub fn release(button: ButtonId) -> Self {
        Self {
            button,
            edge: Edge::Release,
        }
    }

    /// Discrete key-event number for cores that take one update per event.
    /// Presses are 0..=7 and releases 8..=15, each in button index order.
    pub fn code(&self) -> u8 {
        match self.edge {
            Edge::Press => self.button.index(),
            Edge::Release => self.button.index() + 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let button = *ButtonId::ALL.get(code as usize % 8)?;
        match code {
            0..=7 => Some(Self::press(button)),
            8..=15 => Some(Self::release(button)),
            _ => None,
        }
    }
}
