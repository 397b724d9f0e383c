use clap::Parser;
use dialoguer::MultiSelect;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI devices
    #[arg(long)]
    pub device_list: bool,

    /// Bind to a MIDI device (repeat for several devices)
    #[arg(long)]
    pub bind_to_device: Vec<String>,

    /// Configuration file (toml, yaml or json)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Print every decoded event to stdout
    #[arg(long)]
    pub monitor: bool,

    /// Pick input devices interactively
    #[arg(long)]
    pub select: bool,

    /// Send a Controller Change (KEY:VALUE) to every bound device on startup
    #[arg(long, value_parser = parse_cc)]
    pub send_cc: Vec<(u8, u8)>,
}

/// Parses `KEY:VALUE` with both halves in 0-127
pub fn parse_cc(s: &str) -> Result<(u8, u8), String> {
    let (key, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected KEY:VALUE, got '{}'", s))?;
    let parse = |part: &str| -> Result<u8, String> {
        match part.trim().parse::<u8>() {
            Ok(n) if n <= 127 => Ok(n),
            _ => Err(format!("'{}' is not a MIDI data byte (0-127)", part)),
        }
    };
    Ok((parse(key)?, parse(value)?))
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}

/// Prompts for one or more devices out of `devices`
pub fn select_devices(devices: &[String]) -> std::io::Result<Vec<String>> {
    if devices.is_empty() {
        return Ok(Vec::new());
    }

    let chosen = MultiSelect::new()
        .with_prompt("Select MIDI input devices (space to toggle, enter to confirm)")
        .items(devices)
        .interact()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    Ok(chosen.into_iter().map(|i| devices[i].clone()).collect())
}
