//! Acoustic modem transport abstraction and simulator
//!
//! [`ModemDriver`] is a vendor-neutral interface over acoustic modems, so
//! application code written against it runs unchanged on real hardware
//! adapters. [`MockModem`] is the in-tree implementation: a simulated
//! channel with propagation delay, packet loss, and bit errors, for
//! testing full encode → transmit → receive → decode pipelines without
//! any hardware.
//!
//! The mock runs on a simulated monotonic clock. Nothing is delivered
//! inside [`ModemDriver::send_frame`]; frames sit in a time-ordered queue
//! until a caller advances the clock with [`MockModem::advance`], at which
//! point loss and corruption are rolled and surviving frames fan out to
//! every registered RX callback. Loss and bit errors are channel
//! outcomes, not errors: a dropped frame is silence, a corrupted one is a
//! later checksum failure at the receiver.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::ModemError;

/// Callback invoked for each received frame: `(frame bytes, source id)`.
///
/// Callbacks run on whichever worker advances the simulated clock; they
/// must not block and must not call back into the transport.
pub type RxCallback = Box<dyn FnMut(&[u8], u8) + Send>;

/// Vendor-neutral interface over acoustic modem drivers.
///
/// Implementations include [`MockModem`] for simulation; real hardware
/// adapters implement the same surface over a serial or TCP link.
pub trait ModemDriver {
    /// Connect to the modem. For the mock this starts the simulation; for
    /// real hardware it opens the port.
    fn connect(&mut self);

    /// Transmit a frame to a destination vehicle. Fails synchronously when
    /// the modem is disconnected or the frame exceeds the modem MTU.
    fn send_frame(&mut self, data: &[u8], dest_id: u8) -> Result<(), ModemError>;

    /// Register a callback for received frames. All registered callbacks
    /// see every delivery.
    fn attach_rx_callback(&mut self, callback: RxCallback);

    /// Disconnect. Pending deliveries are dropped and callbacks detached.
    fn disconnect(&mut self);
}

/// Channel parameters for the simulated acoustic link.
///
/// Defaults model a short-range link in decent conditions: one second of
/// propagation delay, 5% packet loss, 0.01% bit error rate, and a 64-byte
/// MTU typical of commercial acoustic modems.
#[derive(Debug, Clone)]
pub struct MockModemConfig {
    /// One-way propagation delay applied to every frame
    pub transmission_delay: Duration,
    /// Probability that a frame is silently dropped, 0.0-1.0
    pub packet_loss_probability: f64,
    /// Per-bit flip probability, 0.0-1.0
    pub bit_error_rate: f64,
    /// Hard MTU in bytes; larger frames fail at send time
    pub max_frame_size: usize,
    /// Link data rate in bits per second (reporting only)
    pub data_rate: u32,
}

impl Default for MockModemConfig {
    fn default() -> Self {
        Self {
            transmission_delay: Duration::from_secs(1),
            packet_loss_probability: 0.05,
            bit_error_rate: 0.0001,
            max_frame_size: 64,
            data_rate: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Disconnected,
    Connected,
}

#[derive(Debug)]
struct PendingFrame {
    deliver_at: Duration,
    seq: u64,
    data: Vec<u8>,
    dest_id: u8,
}

/// Simulated acoustic modem.
///
/// Operates in loopback: a sent frame is echoed back to the local RX
/// callbacks after the configured delay, with the addressed destination
/// reported as the frame's originating id. This is enough to exercise a
/// full protocol stack on one machine.
pub struct MockModem {
    config: MockModemConfig,
    state: LinkState,
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingFrame>,
    callbacks: Vec<RxCallback>,
    rng: StdRng,
}

impl MockModem {
    /// Create a modem with entropy-seeded channel randomness.
    pub fn new(config: MockModemConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a modem with a fixed seed for reproducible channel behavior.
    pub fn with_seed(config: MockModemConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut config: MockModemConfig, rng: StdRng) -> Self {
        config.packet_loss_probability = config.packet_loss_probability.clamp(0.0, 1.0);
        config.bit_error_rate = config.bit_error_rate.clamp(0.0, 1.0);
        Self {
            config,
            state: LinkState::Disconnected,
            now: Duration::ZERO,
            next_seq: 0,
            pending: Vec::new(),
            callbacks: Vec::new(),
            rng,
        }
    }

    /// Channel configuration.
    pub fn config(&self) -> &MockModemConfig {
        &self.config
    }

    /// Whether the modem is connected.
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Frames queued but not yet delivered.
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    /// Advance the simulated clock and deliver every frame that comes due,
    /// in scheduled order with submission-order tie-breaks. Loss and bit
    /// errors are rolled here, at delivery time.
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
        let now = self.now;

        let mut due: Vec<PendingFrame> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].deliver_at <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.deliver_at.cmp(&b.deliver_at).then(a.seq.cmp(&b.seq)));

        for frame in due {
            if self.rng.gen::<f64>() < self.config.packet_loss_probability {
                debug!(
                    "frame lost in channel ({} bytes to id {})",
                    frame.data.len(),
                    frame.dest_id
                );
                continue;
            }
            let mut data = frame.data;
            if self.config.bit_error_rate > 0.0 {
                let flipped = inject_bit_errors(&mut self.rng, &mut data, self.config.bit_error_rate);
                if flipped > 0 {
                    debug!("injected {} bit errors into {}-byte frame", flipped, data.len());
                }
            }
            debug!("delivering {} bytes from id {}", data.len(), frame.dest_id);
            for callback in &mut self.callbacks {
                callback(&data, frame.dest_id);
            }
        }
    }
}

impl ModemDriver for MockModem {
    fn connect(&mut self) {
        if self.state == LinkState::Connected {
            return;
        }
        debug!(
            "mock modem connected: delay={:?} loss={:.1}% ber={:.3}% mtu={}",
            self.config.transmission_delay,
            self.config.packet_loss_probability * 100.0,
            self.config.bit_error_rate * 100.0,
            self.config.max_frame_size
        );
        self.state = LinkState::Connected;
    }

    fn send_frame(&mut self, data: &[u8], dest_id: u8) -> Result<(), ModemError> {
        if self.state != LinkState::Connected {
            return Err(ModemError::NotConnected);
        }
        if data.len() > self.config.max_frame_size {
            return Err(ModemError::FrameTooLarge {
                size: data.len(),
                max: self.config.max_frame_size,
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingFrame {
            deliver_at: self.now + self.config.transmission_delay,
            seq,
            data: data.to_vec(),
            dest_id,
        });
        debug!("queued {} bytes to id {} (seq {})", data.len(), dest_id, seq);
        Ok(())
    }

    fn attach_rx_callback(&mut self, callback: RxCallback) {
        self.callbacks.push(callback);
    }

    fn disconnect(&mut self) {
        if self.state == LinkState::Disconnected {
            return;
        }
        let dropped = self.pending.len();
        self.pending.clear();
        self.callbacks.clear();
        self.state = LinkState::Disconnected;
        debug!("mock modem disconnected ({} pending frames dropped)", dropped);
    }
}

fn inject_bit_errors(rng: &mut StdRng, data: &mut [u8], ber: f64) -> usize {
    let mut flipped = 0;
    for byte in data.iter_mut() {
        for bit in 0..8 {
            if rng.gen::<f64>() < ber {
                *byte ^= 1 << bit;
                flipped += 1;
            }
        }
    }
    flipped
}
