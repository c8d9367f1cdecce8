use crate::{controller::ButtonEvent, error::ReplayError};

/// A button event stamped with the step it was applied before.
#[derive(Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct InputEntry {
    pub tick: u64,
    pub event: ButtonEvent,
}

/// Recorded input, replayable against the same ROM from a reset.
#[derive(Clone, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct InputLog {
    entries: Vec<InputEntry>,
}

impl InputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: u64, event: ButtonEvent) {
        debug_assert!(self.entries.last().map_or(true, |e| e.tick <= tick));
        self.entries.push(InputEntry { tick, event });
    }

    pub fn entries(&self) -> &[InputEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReplayError> {
        let (log, _): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;

        if let Some(i) = log
            .entries
            .windows(2)
            .position(|w| w[0].tick > w[1].tick)
        {
            return Err(ReplayError::Unordered(i + 1));
        }

        Ok(log)
    }
}

/// Appends events stamped relative to the step count at which recording began.
#[derive(Clone, Debug)]
pub(crate) struct Recorder {
    log: InputLog,
    origin: u64,
}

impl Recorder {
    pub(crate) fn new(origin: u64) -> Self {
        Self {
            log: InputLog::new(),
            origin,
        }
    }

    pub(crate) fn record(&mut self, steps: u64, event: ButtonEvent) {
        self.log.push(steps - self.origin, event);
    }

    pub(crate) fn finish(self) -> InputLog {
        self.log
    }
}

/// Cursor over an `InputLog` during playback.
#[derive(Clone, Debug)]
pub(crate) struct Playback {
    log: InputLog,
    next: usize,
    origin: u64,
}

impl Playback {
    pub(crate) fn new(log: InputLog, origin: u64) -> Self {
        Self {
            log,
            next: 0,
            origin,
        }
    }

    /// Events due once `steps` steps have run, including any that were skipped
    /// over.
    pub(crate) fn due(&mut self, steps: u64) -> Vec<ButtonEvent> {
        let tick = steps - self.origin;
        let start = self.next;
        while let Some(entry) = self.log.entries.get(self.next) {
            if entry.tick > tick {
                break;
            }
            self.next += 1;
        }
        self.log.entries[start..self.next]
            .iter()
            .map(|e| e.event)
            .collect()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.next >= self.log.entries.len()
    }
}
