use midiroute::dispatch::{
    create_shared_mapping, is_routine_skip, ConfigMapping, DeviceIdentity, DispatchOutcome,
    Dispatcher, MessageHandler,
};
use midiroute::midi::{extract, MidiError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Records every call so tests can check what the dispatcher did.
#[derive(Default)]
struct RecordingMapping {
    registered: HashSet<(String, u8)>,
    reject: bool,
    calls: Vec<(String, String, u8, f32)>,
    shaping: Arc<AtomicBool>,
    overlaps: usize,
}

impl RecordingMapping {
    fn with_keys(keys: &[(&str, u8)]) -> Self {
        RecordingMapping {
            registered: keys.iter().map(|(d, k)| (d.to_string(), *k)).collect(),
            ..Default::default()
        }
    }

    fn applies(&self) -> usize {
        self.calls.iter().filter(|(phase, ..)| phase == "apply").count()
    }
}

impl ConfigMapping for RecordingMapping {
    type Target = (String, u8);

    fn exists(&self, device: &str, key: u8) -> bool {
        self.registered.contains(&(device.to_string(), key))
    }

    fn get_target(&self, device: &str, key: u8) -> Option<Self::Target> {
        self.registered.get(&(device.to_string(), key)).cloned()
    }

    fn shape(&mut self, _: &Self::Target, device: &str, kind: &str, key: u8, value: &mut f32) -> bool {
        if self.shaping.swap(true, Ordering::SeqCst) {
            self.overlaps += 1;
        }
        self.calls
            .push(("shape".to_string(), format!("{}/{}", device, kind), key, *value));
        thread::yield_now();
        if self.reject {
            self.shaping.store(false, Ordering::SeqCst);
            return false;
        }
        *value /= 127.0;
        true
    }

    fn apply(&mut self, _: &Self::Target, device: &str, key: u8, value: f32) {
        if !self.shaping.swap(false, Ordering::SeqCst) {
            self.overlaps += 1;
        }
        self.calls
            .push(("apply".to_string(), device.to_string(), key, value));
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_unknown_key_performs_no_mutation() {
    init_logging();
    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[("pad", 10)]));
    let dispatcher = Dispatcher::new(mapping.clone());
    let device = DeviceIdentity::new("pad", 0);

    let event = extract(&[0xB0, 11, 100]).unwrap();
    let outcome = dispatcher.dispatch(&device, &event).unwrap();
    assert_eq!(outcome, DispatchOutcome::UnknownKey);

    let other_device = DeviceIdentity::new("keys", 1);
    let event = extract(&[0xB0, 10, 100]).unwrap();
    let outcome = dispatcher.dispatch(&other_device, &event).unwrap();
    assert_eq!(outcome, DispatchOutcome::UnknownKey);

    assert!(mapping.lock().unwrap().calls.is_empty());
}

#[test]
fn test_registered_key_is_shaped_then_applied() {
    init_logging();
    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[("pad", 10)]));
    let dispatcher = Dispatcher::new(mapping.clone());
    let device = DeviceIdentity::new("pad", 0);

    let outcome = dispatcher.handle_raw(&device, &[0xB4, 10, 127]).unwrap();
    assert_eq!(outcome, DispatchOutcome::Applied);

    let mapping = mapping.lock().unwrap();
    assert_eq!(
        mapping.calls,
        vec![
            ("shape".to_string(), "pad/controller_change".to_string(), 10, 127.0),
            ("apply".to_string(), "pad".to_string(), 10, 1.0),
        ]
    );
}

#[test]
fn test_note_off_kind_name_reaches_shape() {
    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[("keys", 60)]));
    let dispatcher = Dispatcher::new(mapping.clone());
    let device = DeviceIdentity::new("keys", 2);

    dispatcher.handle_raw(&device, &[0x90, 60, 0]).unwrap();

    let mapping = mapping.lock().unwrap();
    assert_eq!(mapping.calls[0].1, "keys/note_off");
}

#[test]
fn test_rejected_shape_skips_apply() {
    let mut recording = RecordingMapping::with_keys(&[("pad", 10)]);
    recording.reject = true;
    let mapping = create_shared_mapping(recording);
    let dispatcher = Dispatcher::new(mapping.clone());

    let outcome = dispatcher
        .handle_raw(&DeviceIdentity::new("pad", 0), &[0xB0, 10, 5])
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::ShapeRejected);
    assert_eq!(mapping.lock().unwrap().applies(), 0);
}

#[test]
fn test_short_messages_are_malformed_for_dispatch() {
    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[("pad", 10)]));
    let dispatcher = Dispatcher::new(mapping.clone());
    let device = DeviceIdentity::new("pad", 0);

    assert!(matches!(
        dispatcher.handle_raw(&device, &[0xF8]),
        Err(MidiError::MalformedMessage { .. })
    ));
    assert!(matches!(
        dispatcher.handle_raw(&device, &[0xC0, 10]),
        Err(MidiError::MalformedMessage { len: 2, needed: 3 })
    ));
    assert!(matches!(
        dispatcher.handle_raw(&device, &[]),
        Err(MidiError::MalformedMessage { len: 0, .. })
    ));
    assert!(mapping.lock().unwrap().calls.is_empty());
}

#[test]
fn test_handler_skips_bad_messages_and_keeps_going() {
    init_logging();
    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[("pad", 10)]));
    let dispatcher = Dispatcher::new(mapping.clone());
    let device = DeviceIdentity::new("pad", 0);

    dispatcher.on_raw_message(&device, &[]);
    dispatcher.on_raw_message(&device, &[0xB0]);
    dispatcher.on_raw_message(&device, &[0xF8]);
    dispatcher.on_raw_message(&device, &[0xB0, 10, 64]);

    assert_eq!(mapping.lock().unwrap().applies(), 1);
}

#[test]
fn test_concurrent_devices_never_interleave_shape_and_apply() {
    init_logging();
    const EVENTS_PER_DEVICE: u8 = 100;

    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[
        ("left", 1),
        ("right", 1),
    ]));
    let dispatcher = Dispatcher::new(mapping.clone());

    let handles: Vec<_> = ["left", "right"]
        .iter()
        .enumerate()
        .map(|(port, name)| {
            let dispatcher = dispatcher.clone();
            let device = DeviceIdentity::new(*name, port);
            thread::spawn(move || {
                for value in 0..EVENTS_PER_DEVICE {
                    dispatcher.on_raw_message(&device, &[0xB0, 1, value]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("device thread panicked");
    }

    let mapping = mapping.lock().unwrap();
    assert_eq!(mapping.overlaps, 0);
    assert_eq!(mapping.applies(), 2 * EVENTS_PER_DEVICE as usize);

    // Every shape is immediately followed by the apply for the same device.
    for pair in mapping.calls.chunks(2) {
        assert_eq!(pair[0].0, "shape");
        assert_eq!(pair[1].0, "apply");
        assert!(pair[0].1.starts_with(&format!("{}/", pair[1].1)));
        assert_eq!(pair[0].3 / 127.0, pair[1].3);
    }
}

#[test]
fn test_external_reader_shares_the_lock() {
    let mapping = create_shared_mapping(RecordingMapping::with_keys(&[("pad", 10)]));
    let dispatcher = Dispatcher::new(mapping.clone());

    let guard = mapping.lock().unwrap();
    let worker = {
        let dispatcher = dispatcher.clone();
        thread::spawn(move || {
            dispatcher
                .handle_raw(&DeviceIdentity::new("pad", 0), &[0xB0, 10, 1])
                .unwrap()
        })
    };
    thread::sleep(std::time::Duration::from_millis(20));
    assert!(guard.calls.is_empty());
    drop(guard);

    assert_eq!(worker.join().unwrap(), DispatchOutcome::Applied);
    assert!(Arc::ptr_eq(dispatcher.mapping(), &mapping));
}

#[test]
fn test_routine_skips_are_non_channel_messages() {
    assert!(is_routine_skip(&[0xF8]));
    assert!(is_routine_skip(&[0xFA]));
    assert!(is_routine_skip(&[0x40]));
    assert!(!is_routine_skip(&[0xB0]));
    assert!(!is_routine_skip(&[0xC3, 1]));
    assert!(!is_routine_skip(&[]));
}
