use clap::Parser;
use crossbeam::channel::Receiver;
use midiroute::{
    cli::{select_devices, validate_device, Args},
    config::Settings,
    create_scheduler, create_shared_mapping,
    event_loop::{inbound_channel, EventLoop, InboundMessage, InboundSender},
    handle_device_list, logging,
    mapping::KeyMap,
    midi::{midir_engine::sanitize_port_name, DefaultMidiEngine, MidiEngine},
    Dispatcher, Scheduler,
};
use std::{io, thread, time::Duration};

fn main() {
    let args = parse_command_line_arguments();
    let settings = load_settings(&args);
    initialize_logging(&settings);
    let devices = get_available_devices();

    if args.device_list {
        list_available_devices(&devices);
        return;
    }

    let device_names = resolve_device_names(&args, &settings, &devices);
    if device_names.is_empty() {
        fail("No MIDI devices to bind. Use --bind-to-device, --select or the `devices` setting.");
    }
    for device_name in &device_names {
        if let Err(error_msg) = validate_device(device_name, &devices) {
            fail(&error_msg);
        }
    }
    for device_name in settings.unbound_target_devices(&device_names) {
        log::warn!(
            "Targets for device '{}' will never fire: it is not bound",
            device_name
        );
    }

    let mapping = create_shared_mapping(KeyMap::from_settings(&settings));
    let dispatcher = Dispatcher::new(mapping);
    let (inbound_tx, inbound_rx) = inbound_channel();

    let scheduler = create_scheduler();
    start_dispatch_loop(&scheduler, dispatcher, inbound_rx, args.monitor);

    let mut sessions = open_devices(&settings.client_name, &device_names, inbound_tx);
    send_startup_messages(&mut sessions, &args.send_cc);
    run_application_loop(sessions);
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn load_settings(args: &Args) -> Settings {
    match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn initialize_logging(settings: &Settings) {
    let level = settings
        .log_level_filter()
        .unwrap_or(log::LevelFilter::Info);
    if let Err(e) = logging::init_logger(level) {
        eprintln!("Logging disabled: {}", e);
    }
    log::info!("Application starting");
}

fn get_available_devices() -> Vec<String> {
    handle_device_list()
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn resolve_device_names(args: &Args, settings: &Settings, devices: &[String]) -> Vec<String> {
    if args.select {
        return match select_devices(devices) {
            Ok(chosen) => chosen,
            Err(e) => fail(&format!("Device selection failed: {}", e)),
        };
    }
    let configured = if args.bind_to_device.is_empty() {
        &settings.devices
    } else {
        &args.bind_to_device
    };
    configured.iter().map(|name| sanitize_port_name(name)).collect()
}

fn start_dispatch_loop<T: Scheduler>(
    scheduler: &T,
    dispatcher: Dispatcher<KeyMap>,
    inbound_rx: Receiver<InboundMessage>,
    monitor: bool,
) {
    let event_loop = EventLoop::new(dispatcher, inbound_rx).with_monitor(monitor);
    let spawned = scheduler.spawn(move || {
        event_loop.run();
    });
    if let Err(e) = spawned {
        fail(&format!("Could not start dispatch loop: {}", e));
    }
}

fn open_devices(
    client_name: &str,
    device_names: &[String],
    inbound_tx: InboundSender,
) -> Vec<DefaultMidiEngine> {
    let mut sessions = Vec::with_capacity(device_names.len());

    for device_name in device_names {
        let session = DefaultMidiEngine::find_port(device_name)
            .and_then(|port| {
                DefaultMidiEngine::open(client_name, device_name, port, inbound_tx.clone())
            });
        match session {
            Ok(session) => {
                log::info!("Successfully connected to MIDI device: {}", session.identity());
                println!("Successfully connected to MIDI device: {}", session.identity());
                sessions.push(session);
            }
            Err(e) => fail(&format!("Error connecting to MIDI device {}: {}", device_name, e)),
        }
    }

    sessions
}

fn send_startup_messages(sessions: &mut [DefaultMidiEngine], messages: &[(u8, u8)]) {
    for session in sessions.iter_mut() {
        if !messages.is_empty() && !session.has_output() {
            log::warn!("{} has no output port, skipping --send-cc", session.identity());
            continue;
        }
        for &(key, value) in messages {
            if let Err(e) = session.send_cc(key, value) {
                log::warn!("Could not send CC {} to {}: {}", key, session.identity(), e);
            }
        }
    }
}

fn run_application_loop(sessions: Vec<DefaultMidiEngine>) {
    log::info!("Application running. Press Enter or Ctrl+C to exit...");
    println!("\nPress Enter or Ctrl+C to exit...");

    // Without a terminal on stdin, run until killed.
    match io::stdin().read_line(&mut String::new()) {
        Ok(n) if n > 0 => {}
        _ => loop {
            thread::sleep(Duration::from_secs(1));
        },
    }

    for session in sessions {
        session.close();
    }
    log::info!("Application stopped");
}

fn fail(error_msg: &str) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}
