//! Integration tests for engines, the collector and the session client

use loco_sound::hal::{MockClock, MockPlayer, MockTransport, PlayerCall};
use loco_sound::traits::{Clock, Transport};
use loco_sound::{
    Collector, Config, Frame, FunctionChange, LocoStatus, Sound, SoundId, Z21Client,
};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

/// Transport that replays scripted receive results, errors included.
#[derive(Default)]
struct ScriptedTransport {
    script: VecDeque<io::Result<Vec<u8>>>,
    sent: usize,
}

impl Transport for ScriptedTransport {
    type Error = io::Error;

    fn send(&mut self, _datagram: &[u8]) -> io::Result<()> {
        self.sent += 1;
        Ok(())
    }

    fn try_receive(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.script.pop_front().transpose()
    }
}

/// Status frame for a 126-step locomotive, forward.
fn status_frame(address: u16, speed: u8, functions: &[u8]) -> Frame {
    let [high, low] = address.to_be_bytes();
    let mut payload = vec![high & 0x3F, low, 0x04, 0x80 | (speed + 1)];
    payload.extend_from_slice(functions);
    Frame::with_payload([0x40, 0x00], 0xEF, payload)
}

fn status(address: u16, speed: u8) -> LocoStatus {
    LocoStatus::decode(&status_frame(address, speed, &[])).unwrap()
}

fn collector() -> Collector<MockPlayer> {
    let mut collector = Collector::new(MockPlayer::new());
    collector.register(2);
    collector.register(232);
    collector.player_mut().clear_calls();
    collector
}

#[test]
fn unregistered_address_changes_nothing() {
    let mut collector = collector();

    assert!(!collector.dispatch(&status(77, 60), 0));

    assert_eq!(collector.addresses().collect::<Vec<_>>(), vec![2, 232]);
    assert_eq!(collector.next_due_ms(), None);
    assert!(collector.player().calls.is_empty());
    for address in [2, 232] {
        assert_eq!(collector.engine(address).unwrap().speed(), 0);
    }
}

#[test]
fn start_and_stop_scheduling() {
    let mut collector = collector();

    collector.dispatch(&status(232, 60), 1_000);
    let engine = collector.engine(232).unwrap();
    assert_eq!(engine.next_due().unwrap().due_ms, 1_000 + 213);
    assert_eq!(collector.next_due_ms(), Some(1_213));

    collector.dispatch(&status(232, 0), 1_100);
    assert_eq!(collector.engine(232).unwrap().next_due(), None);
    assert_eq!(collector.next_due_ms(), None);
}

#[test]
fn tick_twice_without_time_passing() {
    let mut collector = collector();
    collector.dispatch(&status(2, 60), 0);

    assert_eq!(collector.tick(213), 1);
    assert_eq!(collector.tick(213), 0);
    let chuffs = collector
        .player()
        .calls
        .iter()
        .filter(|call| matches!(call, PlayerCall::PlayOnce(SoundId { sound: Sound::Cylinder(_), .. })))
        .count();
    // Cold start chuff plus one periodic chuff
    assert_eq!(chuffs, 2);
}

#[test]
fn engines_run_independently() {
    let mut collector = collector();
    collector.dispatch(&status(2, 126), 0);
    collector.dispatch(&status(232, 10), 0);

    let mut clock = MockClock::new();
    let mut fired = 0;
    while clock.now_ms() < 1_000 {
        clock.advance(1);
        fired += collector.tick(clock.now_ms());
    }

    // 126 -> every 122 ms, 10 -> first after 818 ms
    let two = SoundId::new(2, Sound::Cylinder(0));
    let two_odd = SoundId::new(2, Sound::Cylinder(1));
    let player = collector.player();
    assert_eq!(player.played_once(two) + player.played_once(two_odd), 1 + 8);
    assert_eq!(fired, 8 + 1);
}

#[test]
fn speed_change_smooths_tempo() {
    let mut collector = collector();
    collector.dispatch(&status(232, 1), 0);
    collector.dispatch(&status(232, 126), 100);

    // (122 + 4600) / 2 after the cold start chuff
    assert_eq!(collector.next_due_ms(), Some(2_361));
    assert_eq!(collector.player().played_once(SoundId::new(232, Sound::Start)), 1);
}

#[test]
fn function_sounds_through_collector() {
    let mut collector = collector();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    collector
        .engine_mut(232)
        .bind_observer(7, move |change: &FunctionChange<'_>| {
            sink.lock().unwrap().push(change.new_value);
        });

    // F6 and F7 on: byte 5 bits 1 and 2
    let frame = status_frame(232, 0, &[0x00, 0b0000_0110]);
    collector.dispatch(&LocoStatus::decode(&frame).unwrap(), 0);

    let player = collector.player();
    assert!(player.is_looping(SoundId::new(232, Sound::Ambient)));
    assert_eq!(player.played_once(SoundId::new(232, Sound::Horn)), 1);
    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

#[test]
fn poll_loop_end_to_end() {
    let config = Config::default();
    let mut client = Z21Client::new(MockTransport::new(), &config.z21);
    let mut collector = Collector::with_config(MockPlayer::new(), config.sound, config.chuff);
    for &address in &config.locos {
        collector.register(address);
    }

    client.login(0).unwrap();
    client.subscribe_all_locos().unwrap();
    client.transport_mut().queue_frame(&status_frame(232, 30, &[]));
    client.transport_mut().queue_datagram([0x01, 0x02]);
    client.transport_mut().queue_frame(&status_frame(77, 30, &[]));

    let mut clock = MockClock::new();
    for _ in 0..400 {
        if let Some(frame) = client.poll(clock.now_ms()).unwrap() {
            if let Ok(status) = LocoStatus::decode(&frame) {
                collector.dispatch(&status, clock.now_ms());
            }
        }
        collector.tick(clock.now_ms());
        clock.advance(1);
    }

    let player = collector.player();
    assert_eq!(player.played_once(SoundId::new(232, Sound::Start)), 1);
    // Cold start at 0, periodic at 359
    assert_eq!(player.played_once(SoundId::new(232, Sound::Cylinder(1))), 1);
    assert!(collector.engine(77).is_none());
    assert_eq!(client.transport().sent.len(), 2);
}

#[test]
fn service_survives_transport_error() {
    let mut transport = ScriptedTransport::default();
    transport
        .script
        .push_back(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
    transport
        .script
        .push_back(Ok(status_frame(232, 30, &[]).serialize()));
    let mut client = Z21Client::new(transport, &Config::default().z21);
    let mut collector = collector();

    assert_eq!(collector.service(&mut client, 0), 0);
    assert_eq!(collector.engine(232).unwrap().speed(), 0);

    collector.service(&mut client, 1);
    assert_eq!(collector.engine(232).unwrap().speed(), 30);
    assert_eq!(collector.player().played_once(SoundId::new(232, Sound::Start)), 1);

    // Cold start at 1, next chuff 359 ms later
    assert_eq!(collector.service(&mut client, 360), 1);
}
