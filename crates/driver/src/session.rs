use tracing::{debug, info, warn};

use crate::{
    config::{DriverConfig, InputDelivery},
    controller::{ButtonEvent, ButtonId, ControllerState},
    core::{EmulationCore, KeyInput},
    error::{FrameBufferError, LoadError},
    framebuffer::FrameBuffer,
    replay::{InputLog, Playback, Recorder},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No ROM accepted yet.
    Idle,
    /// A ROM was accepted and the core has not been reset since.
    RomLoaded,
    Running,
    /// Ticking is disabled while the core resets.
    Paused,
}

/// Things a host may want to tell the user about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    RomLoaded {
        size: usize,
    },
    LoadFailed {
        size: usize,
    },
    Reset,
}

/// Owns the core and gates everything that reaches it on the session phase.
pub struct Session<C> {
    core: C,
    phase: SessionPhase,
    controller: ControllerState,
    delivery: InputDelivery,
    frame_buffer: FrameBuffer,
    steps: u64,
    events: Vec<SessionEvent>,
    recorder: Option<Recorder>,
    playback: Option<Playback>,
}

impl<C: EmulationCore> Session<C> {
    pub fn new(core: C, delivery: InputDelivery) -> Self {
        let frame_buffer = FrameBuffer::new(core.frame_buffer_base_offset());

        Self {
            core,
            phase: SessionPhase::Idle,
            controller: ControllerState::empty(),
            delivery,
            frame_buffer,
            steps: 0,
            events: Vec::new(),
            recorder: None,
            playback: None,
        }
    }

    pub fn with_config(core: C, config: &DriverConfig) -> Self {
        if let Some(unit) = config.step_unit.filter(|u| *u != core.step_unit()) {
            warn!(
                "core steps by {:?} but the driver is configured for {:?}",
                core.step_unit(),
                unit
            );
        }
        Self::new(core, config.input_delivery)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn controller(&self) -> ControllerState {
        self.controller
    }

    pub fn frame_buffer(&self) -> FrameBuffer {
        self.frame_buffer
    }

    /// Core steps attempted since the first ROM was loaded.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_phase(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from != to {
            debug!("session phase {from:?} -> {to:?}");
            self.phase = to;
            self.events.push(SessionEvent::PhaseChanged { from, to });
        }
    }

    /// Hand a ROM image to the core. On success the core is reset and the
    /// session is running; on failure nothing changes.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        if !self.core.load(rom) {
            warn!("core rejected ROM image of {} bytes", rom.len());
            self.events.push(SessionEvent::LoadFailed { size: rom.len() });
            return Err(LoadError { size: rom.len() });
        }

        info!("loaded ROM image of {} bytes", rom.len());
        self.events.push(SessionEvent::RomLoaded { size: rom.len() });
        self.set_phase(SessionPhase::RomLoaded);
        self.reset_core();
        Ok(())
    }

    /// Reset the core. Only does anything while running; returns whether a
    /// reset happened.
    pub fn reset(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        info!("resetting core");
        self.reset_core();
        self.events.push(SessionEvent::Reset);
        true
    }

    fn reset_core(&mut self) {
        // No step may run against a half-reset core
        self.set_phase(SessionPhase::Paused);
        self.core.reset();
        self.set_phase(SessionPhase::Running);
    }

    pub fn press_key(&mut self, button: ButtonId) {
        self.apply(ButtonEvent::press(button));
    }

    pub fn release_key(&mut self, button: ButtonId) {
        self.apply(ButtonEvent::release(button));
    }

    /// Apply a live input event. Dropped unless running, and while an input
    /// log is playing back.
    pub fn apply(&mut self, event: ButtonEvent) {
        if !self.is_running() || self.playback.is_some() {
            return;
        }

        self.deliver(event);
        if let Some(rec) = self.recorder.as_mut() {
            rec.record(self.steps, event);
        }
    }

    fn deliver(&mut self, event: ButtonEvent) {
        self.controller.apply(event);
        if self.delivery == InputDelivery::Discrete {
            self.core.update_key(KeyInput::Event(event));
        }
    }

    /// Run one core step. Returns `Ok(false)` without touching the core unless
    /// running.
    pub fn step(&mut self) -> anyhow::Result<bool> {
        if !self.is_running() {
            return Ok(false);
        }

        if let Some(mut playback) = self.playback.take() {
            for event in playback.due(self.steps) {
                self.deliver(event);
            }
            if playback.is_finished() {
                debug!("input playback finished after {} steps", self.steps);
            } else {
                self.playback = Some(playback);
            }
        }

        if self.delivery == InputDelivery::Packed {
            self.core.update_key(KeyInput::State(self.controller));
        }

        self.steps += 1;
        self.core.step()?;
        Ok(true)
    }

    /// Convert the core's current picture into `out` as RGBA.
    pub fn display(&mut self, out: &mut [u8]) -> Result<(), FrameBufferError> {
        let frame_buffer = self.frame_buffer;
        frame_buffer.write_display_buffer(self.core.memory(), out)
    }

    pub fn start_recording(&mut self) {
        self.recorder = Some(Recorder::new(self.steps));
    }

    pub fn stop_recording(&mut self) -> Option<InputLog> {
        self.recorder.take().map(Recorder::finish)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Replay `log` from the next step on. Live input is ignored until the log
    /// runs out.
    pub fn play(&mut self, log: InputLog) {
        if log.is_empty() {
            return;
        }
        self.playback = Some(Playback::new(log, self.steps));
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }
}
