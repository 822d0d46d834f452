// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use tracing::Level;

use padmap::config::settings::SETTINGS_FILE;
use padmap::midi::print_ports;
use padmap::{
    ConfigStore, Direction, Engine, EngineEvent, LearnState, MessageKind, MessageSpec,
    MidirBackend, Settings, ShutdownChoice,
};

const DEFAULT_RUN_SECS: u64 = 30;
const LEARN_TIMEOUT: Duration = Duration::from_secs(30);

fn print_usage() {
    println!("PADMAP - MIDI Pad Mapper");
    println!();
    println!("Usage: padmap [--settings <PATH>] [--verbose] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --list-inputs                         List available MIDI input ports");
    println!("  --list-outputs                        List available MIDI output ports");
    println!("  --show                                Show the controls and the current record");
    println!("  --run [SECONDS]                       Dispatch inbound MIDI (default 30 seconds)");
    println!("  --trigger <NAME>                      Trigger a control");
    println!("  --learn <NAME>                        Bind the next inbound message to a control");
    println!("  --rename <OLD> <NEW>                  Rename a control");
    println!("  --set-input <NAME> <TYPE> <NUMBER>    Set an input binding (TYPE: note, cc, pc)");
    println!("  --set-output <NAME> <TYPE> <NUMBER> [VALUE]");
    println!("                                        Set an output binding");
    println!("  --ports <INPUT> <OUTPUT>              Select ports ('-' closes a direction)");
    println!("  --load <PATH>                         Load a record");
    println!("  --save-as <PATH>                      Save the current bindings to a record");
    println!("  --discard                             Throw away unsaved edits");
    println!("  --help                                Show this help message");
    println!();
    println!("Options:");
    println!("  --settings <PATH>   Settings file (default {})", SETTINGS_FILE);
    println!("  --verbose           Log at debug level");
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn open_engine(settings: &Settings) -> Result<(Engine, Receiver<EngineEvent>)> {
    let store = ConfigStore::open(&settings.config_dir)
        .with_context(|| format!("opening config directory {:?}", settings.config_dir))?;
    let backend = MidirBackend::new(settings.client_name.clone());
    let (mut engine, events) = Engine::new(store, Box::new(backend));
    engine.start()?;
    Ok((engine, events))
}

fn show(engine: &Engine) {
    println!("Config: {}", engine.label());
    for direction in [Direction::Input, Direction::Output] {
        println!(
            "{:<7} {}",
            format!("{}:", direction),
            engine.ports().port_name(direction).unwrap_or("(none)")
        );
    }
    println!();
    for (id, control) in engine.table().iter_in_order() {
        println!(
            "  {}. {:<16} in: {:<18} out: {}",
            id.index() + 1,
            control.name,
            control.input.to_string(),
            control.output
        );
    }
}

fn print_events(events: &Receiver<EngineEvent>) {
    for event in events.try_iter() {
        match event {
            EngineEvent::TriggerFired { name, .. } => println!("Triggered {}", name),
            EngineEvent::BindingChanged { control, .. } => {
                println!("{}: in {} / out {}", control.name, control.input, control.output)
            }
            EngineEvent::ConfigLabelChanged(label) => println!("Config: {}", label),
            EngineEvent::PersistFailed(reason) => eprintln!("Warning: {}", reason),
            EngineEvent::PortUnavailable {
                direction,
                name,
                reason,
            } => eprintln!("Warning: MIDI {} '{}' unavailable: {}", direction, name, reason),
            EngineEvent::LearnStateChanged { .. } => {}
        }
    }
}

fn run(engine: &mut Engine, events: &Receiver<EngineEvent>, seconds: u64) {
    println!("Dispatching inbound MIDI for {} seconds (press Ctrl+C to stop)...", seconds);
    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        engine.pump_timeout(Duration::from_millis(50));
        print_events(events);
    }
    let stats = engine.dispatch_stats();
    println!(
        "Done: {} inbound, {} triggered, {} discarded",
        stats.inbound, stats.triggers, stats.discarded
    );
}

fn learn(engine: &mut Engine, events: &Receiver<EngineEvent>, name: &str) -> Result<()> {
    if engine.ports().port_name(Direction::Input).is_none() {
        bail!("No input port open; use --ports first");
    }
    engine.on_learn_toggle(true);
    engine.on_learn_select(name)?;
    println!("Waiting for a MIDI message for '{}'...", name);

    let deadline = Instant::now() + LEARN_TIMEOUT;
    while Instant::now() < deadline {
        engine.pump_timeout(Duration::from_millis(50));
        if let LearnState::Captured { spec, .. } = engine.learn_state() {
            println!("Captured {}", spec);
            engine.on_learn_confirm()?;
            print_events(events);
            return Ok(());
        }
    }

    engine.on_learn_cancel();
    bail!("No message received for '{}'", name)
}

fn parse_spec(kind: &str, number: &str, value: Option<&String>) -> Result<MessageSpec> {
    let kind = MessageKind::from_name(kind)
        .ok_or_else(|| anyhow!("Unknown message type '{}' (use note, cc or pc)", kind))?;
    let number: u8 = number
        .parse()
        .map_err(|_| anyhow!("Invalid message number: {}", number))?;
    let mut spec = MessageSpec::unset(kind);
    spec.number = Some(number);
    if let Some(value) = value {
        spec.value = value
            .parse()
            .map_err(|_| anyhow!("Invalid message value: {}", value))?;
    }
    Ok(spec)
}

fn port_arg(arg: &str) -> Option<&str> {
    (arg != "-").then_some(arg)
}

fn require(args: &[String], count: usize, usage: &str) {
    if args.len() < count + 1 {
        eprintln!("Error: {} requires {}", args[0], usage);
        print_usage();
        std::process::exit(1);
    }
}

fn main() -> Result<()> {
    let mut settings_path = PathBuf::from(SETTINGS_FILE);
    let mut verbose = false;
    let mut args: Vec<String> = Vec::new();

    let mut raw = env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--settings" => {
                settings_path = raw
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| anyhow!("--settings requires a path"))?;
            }
            "--verbose" | "-v" => verbose = true,
            _ => args.push(arg),
        }
    }

    if args.is_empty() {
        println!("PADMAP - MIDI Pad Mapper");
        println!("Run with --help for usage information");
        return Ok(());
    }
    if matches!(args[0].as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let settings = Settings::load_or_default(&settings_path)
        .with_context(|| format!("reading settings from {:?}", settings_path))?;
    init_logging(if verbose { Level::DEBUG } else { settings.level()? });

    match args[0].as_str() {
        "--list-inputs" => {
            print_ports(&MidirBackend::new(settings.client_name.clone()), Direction::Input)?;
        }
        "--list-outputs" => {
            print_ports(&MidirBackend::new(settings.client_name.clone()), Direction::Output)?;
        }
        "--show" => {
            let (engine, _events) = open_engine(&settings)?;
            show(&engine);
        }
        "--run" => {
            let seconds = match args.get(1) {
                Some(s) => s.parse().map_err(|_| anyhow!("Invalid duration: {}", s))?,
                None => DEFAULT_RUN_SECS,
            };
            let (mut engine, events) = open_engine(&settings)?;
            run(&mut engine, &events, seconds);
        }
        "--trigger" => {
            require(&args, 1, "a control name");
            let (mut engine, events) = open_engine(&settings)?;
            engine.on_trigger(&args[1])?;
            print_events(&events);
        }
        "--learn" => {
            require(&args, 1, "a control name");
            let (mut engine, events) = open_engine(&settings)?;
            learn(&mut engine, &events, &args[1])?;
        }
        "--rename" => {
            require(&args, 2, "the old and new names");
            let (mut engine, events) = open_engine(&settings)?;
            engine.on_rename(&args[1], &args[2])?;
            print_events(&events);
        }
        "--set-input" => {
            require(&args, 3, "a name, a type and a number");
            let spec = parse_spec(&args[2], &args[3], None)?;
            let (mut engine, events) = open_engine(&settings)?;
            engine.on_set_input(&args[1], spec)?;
            print_events(&events);
        }
        "--set-output" => {
            require(&args, 3, "a name, a type and a number");
            let spec = parse_spec(&args[2], &args[3], args.get(4))?;
            let (mut engine, events) = open_engine(&settings)?;
            engine.on_set_output(&args[1], spec)?;
            print_events(&events);
        }
        "--ports" => {
            require(&args, 2, "an input and an output port name");
            let (mut engine, events) = open_engine(&settings)?;
            let input = engine.request_port_change(Direction::Input, port_arg(&args[1]));
            let output = engine.request_port_change(Direction::Output, port_arg(&args[2]));
            print_events(&events);
            input?;
            output?;
            show(&engine);
        }
        "--load" => {
            require(&args, 1, "a path");
            let (mut engine, events) = open_engine(&settings)?;
            engine.request_load(&args[1])?;
            print_events(&events);
            show(&engine);
        }
        "--save-as" => {
            require(&args, 1, "a path");
            let (mut engine, events) = open_engine(&settings)?;
            engine.request_save_as(&args[1])?;
            engine.shutdown(ShutdownChoice::Discard)?;
            print_events(&events);
        }
        "--discard" => {
            let (mut engine, events) = open_engine(&settings)?;
            engine.shutdown(ShutdownChoice::Discard)?;
            print_events(&events);
            println!("Unsaved edits discarded");
        }
        _ => {
            eprintln!("Unknown option: {}", args[0]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
