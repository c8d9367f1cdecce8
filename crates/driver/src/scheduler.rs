use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    time::Duration,
};

use tracing::error;

use crate::{cadence::Cadence, clock::Clock, core::EmulationCore, session::Session};

/// Paints a finished RGBA picture. Called every display refresh, possibly with
/// an unchanged buffer.
pub trait Renderer {
    fn paint(&mut self, rgba: &[u8], width: usize, height: usize) -> anyhow::Result<()>;
}

impl<F> Renderer for F
where
    F: FnMut(&[u8], usize, usize) -> anyhow::Result<()>,
{
    fn paint(&mut self, rgba: &[u8], width: usize, height: usize) -> anyhow::Result<()> {
        self(rgba, width, height)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub stepped: bool,
    /// How long to wait before the next tick. `None` once stopped.
    pub delay: Option<Duration>,
    pub fault: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresentReport {
    pub painted: bool,
    pub fault: Option<String>,
}

/// Paces core steps against wall-clock time and pushes pictures to a renderer
/// on a separate, host-driven refresh.
///
/// Neither entry point ever fails: faults from the core or renderer are
/// logged, counted and reported, and the caller re-arms as usual.
pub struct Scheduler {
    cadence: Cadence,
    last_step: Option<Duration>,
    display: Vec<u8>,
    faults: u64,
    stopped: bool,
}

impl Scheduler {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            last_step: None,
            display: Vec::new(),
            faults: 0,
            stopped: false,
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// After this neither `tick` nor `refresh` touches the session again.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Last picture handed to the renderer.
    pub fn display(&self) -> &[u8] {
        &self.display
    }

    /// Emulation timer callback. Runs at most one step, once a full interval
    /// has passed since the previous one.
    pub fn tick<C, K>(&mut self, session: &mut Session<C>, clock: &K) -> TickReport
    where
        C: EmulationCore,
        K: Clock + ?Sized,
    {
        if self.stopped {
            return TickReport::default();
        }

        let now = clock.now();
        let mut report = TickReport::default();
        let mut reference = now;

        if session.is_running() {
            let due = self
                .last_step
                .map_or(true, |last| now.saturating_sub(last) >= self.cadence.interval);

            if due {
                // Re-arm from now, not from when the step was due. A late or
                // slow step never causes a burst of catch-up steps.
                self.last_step = Some(now);
                match guarded(|| session.step()) {
                    Ok(stepped) => report.stepped = stepped,
                    Err(msg) => report.fault = Some(self.fault("step", msg)),
                }
            }

            reference = self.last_step.unwrap_or(now);
        }

        let elapsed = clock.now().saturating_sub(reference);
        report.delay = Some(self.cadence.interval.saturating_sub(elapsed));
        report
    }

    /// Display refresh callback. Skipped unless running, which leaves the last
    /// painted picture on screen.
    pub fn refresh<C, R>(&mut self, session: &mut Session<C>, renderer: &mut R) -> PresentReport
    where
        C: EmulationCore,
        R: Renderer + ?Sized,
    {
        if self.stopped || !session.is_running() {
            return PresentReport::default();
        }

        let fb = session.frame_buffer();
        self.display.resize(fb.display_len(), 0xff);

        let display = &mut self.display;
        if let Err(msg) = guarded(|| Ok(session.display(display)?)) {
            return PresentReport {
                painted: false,
                fault: Some(self.fault("present", msg)),
            };
        }

        let display = &self.display;
        match guarded(|| renderer.paint(display, fb.width, fb.height)) {
            Ok(()) => PresentReport {
                painted: true,
                fault: None,
            },
            Err(msg) => PresentReport {
                painted: false,
                fault: Some(self.fault("paint", msg)),
            },
        }
    }

    fn fault(&mut self, what: &str, msg: String) -> String {
        self.faults += 1;
        error!("{what} fault #{}: {msg}", self.faults);
        msg
    }
}

/// Run `f`, folding both errors and panics into a message.
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(panic) => Err(panic_message(&*panic)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
