use crate::{
    cadence::StepUnit,
    controller::{ButtonEvent, ControllerState},
};

/// What a core receives on `update_key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    /// Whole controller byte, sent once per tick.
    State(ControllerState),
    /// A single press or release, sent as it happens.
    Event(ButtonEvent),
}

/// Entry points of an external emulator core.
///
/// The driver never looks inside the core; it only resets, loads, steps and
/// feeds input, and reads the framebuffer window out of `memory`.
pub trait EmulationCore {
    fn reset(&mut self);

    /// Returns `false` if the core does not accept the image.
    fn load(&mut self, rom: &[u8]) -> bool;

    /// Advance by one `step_unit`.
    fn step(&mut self) -> anyhow::Result<()>;

    fn update_key(&mut self, input: KeyInput);

    /// Offset of the RGB framebuffer inside `memory`. Stable for the lifetime
    /// of the core.
    fn frame_buffer_base_offset(&self) -> usize;

    /// Memory that holds the framebuffer window. Takes `&mut self` so cores
    /// living behind a foreign boundary can refresh a local mirror first.
    fn memory(&mut self) -> &[u8];

    fn step_unit(&self) -> StepUnit {
        StepUnit::Frame
    }
}

impl<C: EmulationCore + ?Sized> EmulationCore for Box<C> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn load(&mut self, rom: &[u8]) -> bool {
        (**self).load(rom)
    }

    fn step(&mut self) -> anyhow::Result<()> {
        (**self).step()
    }

    fn update_key(&mut self, input: KeyInput) {
        (**self).update_key(input)
    }

    fn frame_buffer_base_offset(&self) -> usize {
        (**self).frame_buffer_base_offset()
    }

    fn memory(&mut self) -> &[u8] {
        (**self).memory()
    }

    fn step_unit(&self) -> StepUnit {
        (**self).step_unit()
    }
}
