use std::time::Duration;

use js_sys::{Uint8Array, WebAssembly};
use nemu_driver::{clock::Clock, EmulationCore, FrameBuffer, KeyInput, StepUnit};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// An emulator core living on the JavaScript side, e.g. another wasm
    /// module's exported emulator object.
    #[derive(Clone)]
    pub type JsCore;

    #[wasm_bindgen(method)]
    fn reset(this: &JsCore);

    #[wasm_bindgen(method)]
    fn load(this: &JsCore, rom: &[u8]) -> bool;

    #[wasm_bindgen(method, catch)]
    fn step_line(this: &JsCore) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn update_key(this: &JsCore, key: u8);

    #[wasm_bindgen(method)]
    fn get_fb_ptr(this: &JsCore) -> usize;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = now)]
    fn performance_now() -> f64;
}

/// Adapts a `JsCore` to the driver.
///
/// The framebuffer window is copied out of the core's memory into a local
/// mirror whenever the driver asks for it, so the mirror starts at offset 0.
pub(crate) struct JsCoreHandle {
    core: JsCore,
    memory: WebAssembly::Memory,
    fb_ptr: usize,
    window: usize,
    mirror: Vec<u8>,
}

impl JsCoreHandle {
    pub fn new(core: JsCore, memory: WebAssembly::Memory) -> Self {
        let fb_ptr = core.get_fb_ptr();

        Self {
            core,
            memory,
            fb_ptr,
            window: FrameBuffer::new(0).source_len(),
            mirror: Vec::new(),
        }
    }

    pub fn fb_ptr(&self) -> usize {
        self.fb_ptr
    }

    pub fn js(&self) -> &JsCore {
        &self.core
    }
}

impl EmulationCore for JsCoreHandle {
    fn reset(&mut self) {
        self.core.reset();
    }

    fn load(&mut self, rom: &[u8]) -> bool {
        self.core.load(rom)
    }

    fn step(&mut self) -> anyhow::Result<()> {
        self.core
            .step_line()
            .map_err(|e| anyhow::anyhow!("{}", js_message(&e)))
    }

    fn update_key(&mut self, input: KeyInput) {
        self.core.update_key(key_code(input));
    }

    fn frame_buffer_base_offset(&self) -> usize {
        0
    }

    fn memory(&mut self) -> &[u8] {
        // The buffer object is replaced whenever the memory grows
        let bytes = Uint8Array::new(&self.memory.buffer());
        let len = bytes.length() as usize;
        let start = self.fb_ptr.min(len);
        let end = self.fb_ptr.saturating_add(self.window).min(len);

        // A short mirror surfaces as an out-of-bounds present fault
        self.mirror.resize(end - start, 0);
        bytes
            .subarray(start as u32, end as u32)
            .copy_to(&mut self.mirror);
        &self.mirror
    }

    // `step_line` runs a single scanline
    fn step_unit(&self) -> StepUnit {
        StepUnit::Scanline
    }
}

/// The byte handed to the core's `update_key`: the packed controller state, or
/// the press/release event code.
pub(crate) fn key_code(input: KeyInput) -> u8 {
    match input {
        KeyInput::State(state) => state.snapshot(),
        KeyInput::Event(event) => event.code(),
    }
}

pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// `performance.now()`. Waiting is left to the host's timers.
pub(crate) struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now(&self) -> Duration {
        Duration::from_secs_f64(performance_now().max(0.) / 1000.)
    }

    fn sleep(&self, _duration: Duration) {}
}
