use std::collections::VecDeque;

/// Messages waiting for the page to collect.
///
/// Holds at most `CAPACITY` entries; older ones are dropped and counted. A
/// fault identical to the previous one is folded into a repeat count instead
/// of queued again.
#[derive(Debug, Default)]
pub(crate) struct Notices {
    queue: VecDeque<String>,
    dropped: usize,
    last_fault: Option<String>,
    repeats: u64,
}

impl Notices {
    pub const CAPACITY: usize = 64;

    pub fn push(&mut self, msg: String) {
        self.flush_repeats();
        self.last_fault = None;
        self.enqueue(msg);
    }

    /// Queue a fault. Returns `false` when it repeats the previous fault, in
    /// which case it is only counted.
    pub fn fault(&mut self, msg: String) -> bool {
        if self.last_fault.as_deref() == Some(msg.as_str()) {
            self.repeats += 1;
            return false;
        }

        self.flush_repeats();
        self.enqueue(msg.clone());
        self.last_fault = Some(msg);
        true
    }

    /// Everything queued so far, oldest first.
    pub fn take(&mut self) -> Vec<String> {
        self.flush_repeats();

        let mut out = Vec::with_capacity(self.queue.len() + 1);
        if self.dropped > 0 {
            out.push(format!("{} older notifications dropped", self.dropped));
            self.dropped = 0;
        }
        out.extend(self.queue.drain(..));
        out
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    fn flush_repeats(&mut self) {
        if self.repeats > 0 {
            let msg = format!("last fault repeated {} more times", self.repeats);
            self.repeats = 0;
            self.enqueue(msg);
        }
    }

    fn enqueue(&mut self, msg: String) {
        if self.queue.len() == Self::CAPACITY {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_faults_are_folded() {
        let mut n = Notices::default();
        assert!(n.fault("step fault: bad opcode".into()));
        for _ in 0..10_000 {
            assert!(!n.fault("step fault: bad opcode".into()));
        }
        assert_eq!(n.len(), 1);

        assert_eq!(
            n.take(),
            vec![
                "step fault: bad opcode".to_string(),
                "last fault repeated 10000 more times".to_string(),
            ]
        );
        assert!(n.take().is_empty());
    }

    #[test]
    fn distinct_faults_stay_bounded() {
        let mut n = Notices::default();
        for i in 0..10_000 {
            assert!(n.fault(format!("step fault: {i}")));
            assert!(n.len() <= Notices::CAPACITY);
        }

        let out = n.take();
        assert_eq!(out.len(), Notices::CAPACITY + 1);
        assert_eq!(
            out[0],
            format!("{} older notifications dropped", 10_000 - Notices::CAPACITY)
        );
        assert_eq!(out.last().map(String::as_str), Some("step fault: 9999"));
    }

    #[test]
    fn other_messages_end_a_run_of_faults() {
        let mut n = Notices::default();
        n.fault("present fault: x".into());
        n.fault("present fault: x".into());
        n.push("reset".into());
        // The same fault after a reset is news again
        assert!(n.fault("present fault: x".into()));

        assert_eq!(
            n.take(),
            vec![
                "present fault: x".to_string(),
                "last fault repeated 1 more times".to_string(),
                "reset".to_string(),
                "present fault: x".to_string(),
            ]
        );
    }
}
