use std::time::Duration;

use nemu_driver::{
    clock::ManualClock,
    testing::{CoreCall, MockCore},
    ButtonEvent, ButtonId, Cadence, ControllerState, InputDelivery, KeyInput, LoadError,
    Scheduler, Session, SessionEvent, SessionPhase, StepUnit,
};

const ROM: &[u8] = &[0x4e, 0x45, 0x53, 0x1a, 0x01, 0x01];

fn session(delivery: InputDelivery) -> Session<MockCore> {
    Session::new(MockCore::default(), delivery)
}

fn running(delivery: InputDelivery) -> Session<MockCore> {
    let mut s = session(delivery);
    s.load_rom(ROM).unwrap();
    s.drain_events();
    s
}

#[test]
fn load_accepted_rom_starts_running() {
    let mut s = session(InputDelivery::Packed);
    assert_eq!(s.phase(), SessionPhase::Idle);

    s.load_rom(ROM).unwrap();

    assert_eq!(s.phase(), SessionPhase::Running);
    assert_eq!(s.core().calls, vec![CoreCall::Load(ROM.len()), CoreCall::Reset]);
    assert_eq!(
        s.drain_events(),
        vec![
            SessionEvent::RomLoaded { size: ROM.len() },
            SessionEvent::PhaseChanged {
                from: SessionPhase::Idle,
                to: SessionPhase::RomLoaded
            },
            SessionEvent::PhaseChanged {
                from: SessionPhase::RomLoaded,
                to: SessionPhase::Paused
            },
            SessionEvent::PhaseChanged {
                from: SessionPhase::Paused,
                to: SessionPhase::Running
            },
        ]
    );

    // Input now gets through
    s.press_key(ButtonId::A);
    assert!(s.controller().is_pressed(ButtonId::A));
}

#[test]
fn rejected_rom_leaves_idle_session_alone() {
    let mut s = Session::new(MockCore::rejecting(), InputDelivery::Packed);

    assert_eq!(s.load_rom(&[0; 16]), Err(LoadError { size: 16 }));
    assert_eq!(s.phase(), SessionPhase::Idle);
    assert_eq!(s.drain_events(), vec![SessionEvent::LoadFailed { size: 16 }]);
    assert_eq!(s.core().count(CoreCall::Reset), 0);
}

#[test]
fn rejected_rom_leaves_running_session_alone() {
    let mut s = running(InputDelivery::Packed);
    s.press_key(ButtonId::B);
    s.core_mut().accept_roms = false;

    let err = s.load_rom(&[0xde, 0xad]).unwrap_err();
    assert_eq!(err.to_string(), "core rejected ROM image (2 bytes)");
    assert_eq!(s.phase(), SessionPhase::Running);
    assert!(s.controller().is_pressed(ButtonId::B));
    assert_eq!(s.drain_events(), vec![SessionEvent::LoadFailed { size: 2 }]);

    // And the running session keeps stepping
    assert!(s.step().unwrap());
}

#[test]
fn reset_while_running() {
    let mut s = running(InputDelivery::Packed);
    s.step().unwrap();

    assert!(s.reset());

    assert_eq!(s.phase(), SessionPhase::Running);
    assert_eq!(
        s.drain_events(),
        vec![
            SessionEvent::PhaseChanged {
                from: SessionPhase::Running,
                to: SessionPhase::Paused
            },
            SessionEvent::PhaseChanged {
                from: SessionPhase::Paused,
                to: SessionPhase::Running
            },
            SessionEvent::Reset,
        ]
    );
}

#[test]
fn no_step_interleaves_with_reset() {
    let clock = ManualClock::new();
    let mut s = running(InputDelivery::Packed);
    let mut sched = Scheduler::new(Cadence::for_unit(StepUnit::Frame));

    for i in 0..6 {
        sched.tick(&mut s, &clock);
        if i % 2 == 0 {
            s.reset();
        }
        clock.advance(Duration::from_millis(17));
    }

    // Every reset is bracketed by steps, never split by one, and the phase
    // the scheduler sees is always Running again afterwards.
    let calls: Vec<_> = s
        .core()
        .calls
        .iter()
        .filter(|c| matches!(c, CoreCall::Step | CoreCall::Reset))
        .copied()
        .collect();
    assert_eq!(
        calls,
        vec![
            CoreCall::Reset, // from the load
            CoreCall::Step,
            CoreCall::Reset,
            CoreCall::Step,
            CoreCall::Step,
            CoreCall::Reset,
            CoreCall::Step,
            CoreCall::Step,
            CoreCall::Reset,
            CoreCall::Step,
        ]
    );
    assert_eq!(s.phase(), SessionPhase::Running);
}

#[test]
fn reset_when_idle_is_a_silent_no_op() {
    let mut s = session(InputDelivery::Packed);

    assert!(!s.reset());
    assert_eq!(s.phase(), SessionPhase::Idle);
    assert!(s.drain_events().is_empty());
    assert!(s.core().calls.is_empty());
}

#[test]
fn keys_are_ignored_while_idle() {
    for delivery in [InputDelivery::Packed, InputDelivery::Discrete] {
        let mut s = session(delivery);

        s.press_key(ButtonId::Start);
        s.release_key(ButtonId::Select);
        s.press_key(ButtonId::Up);

        assert_eq!(s.controller(), ControllerState::empty());
        assert!(s.core().calls.is_empty());
        assert!(s.drain_events().is_empty());
        assert!(!s.step().unwrap());
        assert!(s.core().calls.is_empty());
    }
}

#[test]
fn packed_input_is_sent_once_per_step() {
    let mut s = running(InputDelivery::Packed);

    s.press_key(ButtonId::Right);
    s.press_key(ButtonId::A);
    // Nothing goes to the core until the next step
    assert!(s.core().key_inputs().is_empty());

    s.step().unwrap();
    s.release_key(ButtonId::A);
    s.step().unwrap();

    assert_eq!(
        s.core().key_inputs(),
        vec![
            KeyInput::State(ControllerState::RIGHT | ControllerState::A),
            KeyInput::State(ControllerState::RIGHT),
        ]
    );
}

#[test]
fn discrete_input_is_forwarded_immediately() {
    let mut s = running(InputDelivery::Discrete);

    s.press_key(ButtonId::Left);
    s.press_key(ButtonId::Left);
    s.release_key(ButtonId::Left);
    s.step().unwrap();

    assert_eq!(
        s.core().key_inputs(),
        vec![
            KeyInput::Event(ButtonEvent::press(ButtonId::Left)),
            KeyInput::Event(ButtonEvent::press(ButtonId::Left)),
            KeyInput::Event(ButtonEvent::release(ButtonId::Left)),
        ]
    );
    assert!(!s.controller().is_pressed(ButtonId::Left));
}

#[test]
fn held_buttons_survive_reset() {
    let mut s = running(InputDelivery::Packed);
    s.press_key(ButtonId::Down);
    s.reset();
    assert!(s.controller().is_pressed(ButtonId::Down));
}

#[test]
fn step_fault_does_not_block_next_step() {
    let clock = ManualClock::new();
    let mut core = MockCore::default();
    core.fail_steps.insert(1);
    let mut s = Session::new(core, InputDelivery::Packed);
    s.load_rom(ROM).unwrap();
    let mut sched = Scheduler::new(Cadence::for_unit(StepUnit::Frame));

    let mut reports = Vec::new();
    for _ in 0..3 {
        reports.push(sched.tick(&mut s, &clock));
        clock.advance(Duration::from_millis(17));
    }

    assert!(reports[0].stepped);
    assert!(reports[1].fault.is_some());
    assert!(reports[2].stepped);
    assert!(reports.iter().all(|r| r.delay.is_some()));
    assert_eq!(s.core().count(CoreCall::Step), 3);
}

#[test]
fn recorded_input_replays_at_the_same_steps() {
    let script = [
        (0, ButtonEvent::press(ButtonId::Start)),
        (2, ButtonEvent::release(ButtonId::Start)),
        (2, ButtonEvent::press(ButtonId::A)),
        (5, ButtonEvent::release(ButtonId::A)),
    ];

    let mut live = running(InputDelivery::Packed);
    live.start_recording();
    let mut script_iter = script.iter().peekable();
    for step in 0..7 {
        while let Some((_, event)) = script_iter.next_if(|(at, _)| *at == step) {
            live.apply(*event);
        }
        live.step().unwrap();
    }
    let log = live.stop_recording().unwrap();
    assert_eq!(log.len(), 4);

    let bytes = log.to_bytes().unwrap();
    let log = nemu_driver::replay::InputLog::from_bytes(&bytes).unwrap();

    let mut replay = running(InputDelivery::Packed);
    replay.play(log);
    assert!(replay.is_playing());
    for step in 0..7 {
        if step < 3 {
            // Ignored while the log plays
            replay.press_key(ButtonId::Select);
        }
        replay.step().unwrap();
    }

    assert!(!replay.is_playing());
    assert_eq!(replay.core().key_inputs(), live.core().key_inputs());
}
