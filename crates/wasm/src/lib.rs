mod js_core;
mod notices;

use js_sys::{Array, WebAssembly};
use nemu_driver::{
    keymap::KeyMap, DriverConfig, Edge, EmulationCore, Scheduler, Session, SessionEvent,
    SessionPhase,
};
use wasm_bindgen::prelude::*;

pub use crate::js_core::JsCore;
use crate::{
    js_core::{JsCoreHandle, PerformanceClock},
    notices::Notices,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(msg: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    fn console_warn(msg: &str);
}

/// Drives a JavaScript emulator core. The page owns the timers: it calls
/// `tick` again after the returned delay, and `refresh` on every animation
/// frame, then blits `frame_len` RGBA bytes from `frame_ptr`.
#[wasm_bindgen]
pub struct NemuDriver {
    session: Session<JsCoreHandle>,
    scheduler: Scheduler,
    keys: KeyMap,
    notices: Notices,
}

#[wasm_bindgen]
impl NemuDriver {
    #[wasm_bindgen(constructor)]
    pub fn new(
        core: JsCore,
        memory: WebAssembly::Memory,
        config_json: Option<String>,
    ) -> Result<NemuDriver, JsError> {
        let config = match config_json {
            Some(json) => DriverConfig::from_json(&json)?,
            None => DriverConfig::default(),
        };

        let core = JsCoreHandle::new(core, memory);
        let core_unit = core.step_unit();
        let cadence = config.cadence(core_unit)?;

        let mut notices = Notices::default();
        if cadence.unit != core_unit {
            let msg = format!(
                "configured for {:?} steps but the core steps by {:?}",
                cadence.unit, core_unit
            );
            console_warn(&msg);
            notices.push(msg);
        }

        Ok(Self {
            session: Session::with_config(core, &config),
            scheduler: Scheduler::new(cadence),
            keys: config.key_map(),
            notices,
        })
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), JsError> {
        let res = self.session.load_rom(rom);
        self.collect_events();
        Ok(res?)
    }

    /// Returns whether the core was actually reset.
    pub fn reset(&mut self) -> bool {
        let reset = self.session.reset();
        self.collect_events();
        reset
    }

    /// Returns whether `key` is bound, so the page knows to swallow it.
    pub fn key_down(&mut self, key: &str) -> bool {
        self.key(key, Edge::Press)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.key(key, Edge::Release)
    }

    fn key(&mut self, key: &str, edge: Edge) -> bool {
        match self.keys.translate(key, edge) {
            Some(event) => {
                self.session.apply(event);
                true
            }
            None => false,
        }
    }

    /// Emulation timer callback. Returns the delay in milliseconds before the
    /// next call, or a negative number once stopped.
    pub fn tick(&mut self) -> f64 {
        let report = self.scheduler.tick(&mut self.session, &PerformanceClock);
        if let Some(fault) = report.fault {
            self.notify_fault("step", &fault);
        }
        match report.delay {
            Some(delay) => delay.as_secs_f64() * 1000.,
            None => -1.,
        }
    }

    /// Display refresh callback. Returns whether a new picture is ready at
    /// `frame_ptr`.
    pub fn refresh(&mut self) -> bool {
        let mut ready = |_: &[u8], _: usize, _: usize| -> anyhow::Result<()> { Ok(()) };
        let report = self.scheduler.refresh(&mut self.session, &mut ready);
        if let Some(fault) = report.fault {
            self.notify_fault("present", &fault);
        }
        report.painted
    }

    pub fn frame_ptr(&self) -> *const u8 {
        self.scheduler.display().as_ptr()
    }

    pub fn frame_len(&self) -> usize {
        self.scheduler.display().len()
    }

    pub fn frame_width(&self) -> usize {
        self.session.frame_buffer().width
    }

    pub fn frame_height(&self) -> usize {
        self.session.frame_buffer().height
    }

    /// Where the core reported its RGB framebuffer in its own memory.
    pub fn core_fb_ptr(&self) -> usize {
        self.session.core().fb_ptr()
    }

    pub fn phase(&self) -> String {
        phase_name(self.session.phase()).to_string()
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Human-readable messages gathered since the last call: loads, resets and
    /// faults. Runs of the same fault arrive as one message plus a count.
    pub fn take_notifications(&mut self) -> Array {
        self.collect_events();
        self.notices
            .take()
            .into_iter()
            .map(|msg| JsValue::from_str(&msg))
            .collect()
    }

    pub fn pending_notifications(&mut self) -> usize {
        self.collect_events();
        self.notices.len()
    }

    /// The JavaScript core this driver wraps.
    pub fn core(&self) -> JsCore {
        self.session.core().js().clone()
    }
}

impl NemuDriver {
    fn collect_events(&mut self) {
        for event in self.session.drain_events() {
            if let Some(msg) = describe(event) {
                self.notices.push(msg);
            }
        }
    }

    fn notify_fault(&mut self, what: &str, msg: &str) {
        let msg = format!("{what} fault: {msg}");
        if self.notices.fault(msg.clone()) {
            console_error(&msg);
        }
    }
}

fn phase_name(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "idle",
        SessionPhase::RomLoaded => "rom_loaded",
        SessionPhase::Running => "running",
        SessionPhase::Paused => "paused",
    }
}

/// Message for the page, if any. Phase changes are left out.
fn describe(event: SessionEvent) -> Option<String> {
    match event {
        SessionEvent::RomLoaded { size } => Some(format!("loaded ROM ({size} bytes)")),
        SessionEvent::LoadFailed { size } => Some(format!("ROM rejected ({size} bytes)")),
        SessionEvent::Reset => Some("reset".to_string()),
        SessionEvent::PhaseChanged { .. } => None,
    }
}

#[wasm_bindgen]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}
