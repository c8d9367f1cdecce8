//! Scriptable stand-in for an emulator core.
//!
//! Records every call the driver makes so tests and offline tools can check
//! ordering, and can be told to reject ROMs, fail or panic on chosen steps, or
//! take a fixed amount of (virtual) time per step.

use std::{collections::HashSet, rc::Rc, time::Duration};

use crate::{
    cadence::StepUnit,
    clock::ManualClock,
    core::{EmulationCore, KeyInput},
    framebuffer::FrameBuffer,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreCall {
    Reset,
    Load(usize),
    Step,
    UpdateKey(KeyInput),
}

pub struct MockCore {
    pub calls: Vec<CoreCall>,
    pub accept_roms: bool,
    /// Step numbers (0-based, counting every attempt) that return an error.
    pub fail_steps: HashSet<u64>,
    /// Step numbers that panic.
    pub panic_steps: HashSet<u64>,
    pub step_unit: StepUnit,
    steps: u64,
    base_offset: usize,
    memory: Vec<u8>,
    step_cost: Option<(Rc<ManualClock>, Duration)>,
}

impl MockCore {
    /// A core whose framebuffer sits `base_offset` bytes into its memory, filled
    /// with `pixel`.
    pub fn new(base_offset: usize, pixel: [u8; 3]) -> Self {
        let fb = FrameBuffer::new(base_offset);
        let mut memory = vec![0; base_offset];
        memory.extend(pixel.repeat(fb.width * fb.height));

        Self {
            calls: Vec::new(),
            accept_roms: true,
            fail_steps: HashSet::new(),
            panic_steps: HashSet::new(),
            step_unit: StepUnit::Frame,
            steps: 0,
            base_offset,
            memory,
            step_cost: None,
        }
    }

    /// Every step advances `clock` by `cost`.
    pub fn with_step_cost(mut self, clock: Rc<ManualClock>, cost: Duration) -> Self {
        self.step_cost = Some((clock, cost));
        self
    }

    pub fn rejecting() -> Self {
        Self {
            accept_roms: false,
            ..Self::default()
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn count(&self, call: CoreCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn key_inputs(&self) -> Vec<KeyInput> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                CoreCall::UpdateKey(input) => Some(*input),
                _ => None,
            })
            .collect()
    }

    /// Overwrite one RGB pixel of the framebuffer.
    pub fn set_pixel(&mut self, row: usize, col: usize, rgb: [u8; 3]) {
        let i = self.base_offset + (row * FrameBuffer::WIDTH + col) * FrameBuffer::CHANNELS;
        self.memory[i..i + 3].copy_from_slice(&rgb);
    }

    /// Drop the end of memory so the framebuffer window no longer fits.
    pub fn truncate_memory(&mut self, len: usize) {
        self.memory.truncate(len);
    }
}

impl Default for MockCore {
    fn default() -> Self {
        Self::new(0, [0, 0, 0])
    }
}

impl EmulationCore for MockCore {
    fn reset(&mut self) {
        self.calls.push(CoreCall::Reset);
    }

    fn load(&mut self, rom: &[u8]) -> bool {
        self.calls.push(CoreCall::Load(rom.len()));
        self.accept_roms
    }

    fn step(&mut self) -> anyhow::Result<()> {
        let n = self.steps;
        self.steps += 1;
        self.calls.push(CoreCall::Step);

        if let Some((clock, cost)) = &self.step_cost {
            clock.advance(*cost);
        }
        if self.panic_steps.contains(&n) {
            panic!("mock core panicked on step {n}");
        }
        if self.fail_steps.contains(&n) {
            anyhow::bail!("mock core failed on step {n}");
        }
        Ok(())
    }

    fn update_key(&mut self, input: KeyInput) {
        self.calls.push(CoreCall::UpdateKey(input));
    }

    fn frame_buffer_base_offset(&self) -> usize {
        self.base_offset
    }

    fn memory(&mut self) -> &[u8] {
        &self.memory
    }

    fn step_unit(&self) -> StepUnit {
        self.step_unit
    }
}
