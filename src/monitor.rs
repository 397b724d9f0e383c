use crate::dispatch::{DeviceIdentity, DispatchOutcome};
use crate::midi::{DecodedEvent, EventKind, Result};
use chrono::{DateTime, Local};

/// Short label for what a dispatch did with an event
pub fn describe_outcome(kind: EventKind, outcome: &Result<DispatchOutcome>) -> &'static str {
    match (kind, outcome) {
        (EventKind::Unrecognized, _) => "unrecognized",
        (_, Ok(DispatchOutcome::Applied)) => "applied",
        (_, Ok(DispatchOutcome::UnknownKey)) => "unmapped",
        (_, Ok(DispatchOutcome::ShapeRejected)) => "rejected",
        (_, Err(_)) => "skipped",
    }
}

pub fn format_event(
    device: &DeviceIdentity,
    event: &DecodedEvent,
    outcome: &Result<DispatchOutcome>,
) -> String {
    format_event_at(Local::now(), device, event, outcome)
}

pub fn format_event_at(
    at: DateTime<Local>,
    device: &DeviceIdentity,
    event: &DecodedEvent,
    outcome: &Result<DispatchOutcome>,
) -> String {
    let key = event
        .key
        .map(|k| k.to_string())
        .unwrap_or_else(|| "-".to_string());
    let value = event
        .value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} ch={} {} key={} value={} [{}]",
        at.format("%H:%M:%S%.3f"),
        device,
        event.channel,
        event.kind,
        key,
        value,
        describe_outcome(event.kind, outcome)
    )
}
