//! Native stand-in for a browser event loop: one thread, two re-arming timers.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
        Arc,
    },
    time::Duration,
};

use tracing::info;

use crate::{
    clock::Clock,
    controller::ButtonEvent,
    core::EmulationCore,
    scheduler::{Renderer, Scheduler},
    session::Session,
};

/// Where button events come from. Unmapped keys must already be filtered out.
pub trait InputSource {
    fn poll_event(&mut self) -> Option<ButtonEvent>;
}

impl InputSource for Receiver<ButtonEvent> {
    fn poll_event(&mut self) -> Option<ButtonEvent> {
        self.try_recv().ok()
    }
}

impl InputSource for std::collections::VecDeque<ButtonEvent> {
    fn poll_event(&mut self) -> Option<ButtonEvent> {
        self.pop_front()
    }
}

pub struct NoInput;

impl InputSource for NoInput {
    fn poll_event(&mut self) -> Option<ButtonEvent> {
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub steps: u64,
    pub paints: u64,
    pub faults: u64,
}

pub struct HostLoop {
    refresh_interval: Duration,
    stop: StopHandle,
}

impl HostLoop {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            stop: StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run until stopped through a `StopHandle`. Input is drained before every
    /// tick. On return the scheduler is stopped as well.
    pub fn run<C, R, I, K>(
        &self,
        session: &mut Session<C>,
        scheduler: &mut Scheduler,
        renderer: &mut R,
        input: &mut I,
        clock: &K,
    ) -> LoopStats
    where
        C: EmulationCore,
        R: Renderer + ?Sized,
        I: InputSource + ?Sized,
        K: Clock + ?Sized,
    {
        let mut stats = LoopStats::default();
        let mut next_tick = clock.now();
        let mut next_refresh = next_tick;

        while !self.stop.is_stopped() {
            let now = clock.now();

            if now >= next_tick {
                while let Some(event) = input.poll_event() {
                    session.apply(event);
                }

                let report = scheduler.tick(session, clock);
                stats.ticks += 1;
                stats.steps += report.stepped as u64;
                stats.faults += report.fault.is_some() as u64;

                match report.delay {
                    Some(delay) => next_tick = clock.now() + delay,
                    None => break,
                }
            }

            if self.stop.is_stopped() {
                break;
            }

            if now >= next_refresh {
                let report = scheduler.refresh(session, renderer);
                stats.paints += report.painted as u64;
                stats.faults += report.fault.is_some() as u64;
                next_refresh = now + self.refresh_interval;
            }

            let wake = next_tick.min(next_refresh);
            let now = clock.now();
            if wake > now {
                clock.sleep(wake - now);
            }
        }

        scheduler.stop();
        info!(
            "host loop stopped after {} ticks, {} steps, {} paints",
            stats.ticks, stats.steps, stats.paints
        );
        stats
    }
}
