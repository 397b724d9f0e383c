// event_loop.rs

use crate::dispatch::{ConfigMapping, DeviceIdentity, Dispatcher, MessageHandler};
use crate::monitor;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, error, info};

/// A raw message tagged with the device it arrived from
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub device: DeviceIdentity,
    pub raw: Vec<u8>,
}

/// Device-side half of the loop: installed as a session's handler, it
/// forwards each callback's bytes onto the shared channel in arrival order.
#[derive(Clone)]
pub struct InboundSender {
    tx: Sender<InboundMessage>,
}

impl MessageHandler for InboundSender {
    fn on_raw_message(&self, device: &DeviceIdentity, raw: &[u8]) {
        let message = InboundMessage {
            device: device.clone(),
            raw: raw.to_vec(),
        };
        if self.tx.send(message).is_err() {
            error!("Dispatch loop has stopped, dropping message from {}", device);
        }
    }
}

/// Creates the channel pair connecting device sessions to an [`EventLoop`]
pub fn inbound_channel() -> (InboundSender, Receiver<InboundMessage>) {
    let (tx, rx) = unbounded();
    (InboundSender { tx }, rx)
}

/// Single dispatch loop fed by every device session.
///
/// Messages from one device are dispatched in the order that device
/// delivered them; messages from different devices interleave freely.
pub struct EventLoop<M> {
    dispatcher: Dispatcher<M>,
    inbound_rx: Receiver<InboundMessage>,
    monitor: bool,
}

impl<M: ConfigMapping> EventLoop<M> {
    pub fn new(dispatcher: Dispatcher<M>, inbound_rx: Receiver<InboundMessage>) -> Self {
        EventLoop {
            dispatcher,
            inbound_rx,
            monitor: false,
        }
    }

    /// Prints every decoded event and its outcome to stdout
    pub fn with_monitor(mut self, enabled: bool) -> Self {
        self.monitor = enabled;
        self
    }

    /// Runs until every sender has been dropped. Returns the number of
    /// messages processed.
    pub fn run(&self) -> u64 {
        info!("Dispatch loop started");
        let mut processed = 0;

        // Block until the next inbound message; ends once all senders are gone.
        for message in self.inbound_rx.iter() {
            let result = self.dispatcher.process(&message.device, &message.raw);
            if self.monitor {
                if let Some((event, outcome)) = &result {
                    println!("{}", monitor::format_event(&message.device, event, outcome));
                }
            }
            processed += 1;
        }

        debug!("Inbound channel closed after {} message(s)", processed);
        info!("Dispatch loop stopped");
        processed
    }
}
