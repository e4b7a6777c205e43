//! Actuator signaling.
//!
//! Three fixed single-byte codes and the dwell-then-idle sequence that
//! delivers them. The sequence is the only state machine in the crate:
//! `Idle -> Signaled` on the primary transmit, `Signaled -> Idle` on the
//! reset transmit after the dwell. The reset transmit is unconditional; a
//! failed primary transmit must not stop it.
//!
//! Transmission is fire-and-forget: no acknowledgement, no retry, no
//! verification that the actuator acted on a code.

use std::thread;
use std::time::Duration;

use crate::decide::Outcome;
use crate::error::ChannelError;

/// Opaque single-byte actuator codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalCode {
    Medical,
    NonMedical,
    Idle,
}

impl SignalCode {
    /// Byte payload written to the channel.
    pub fn byte(self) -> u8 {
        match self {
            SignalCode::Medical => b'1',
            SignalCode::NonMedical => b'3',
            SignalCode::Idle => b'2',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalCode::Medical => "MEDICAL_SIGNAL",
            SignalCode::NonMedical => "NONMEDICAL_SIGNAL",
            SignalCode::Idle => "IDLE_SIGNAL",
        }
    }
}

/// Primary code for a classification outcome. Pure lookup.
pub fn signal_for(outcome: Outcome) -> SignalCode {
    match outcome {
        Outcome::Medical => SignalCode::Medical,
        Outcome::NonMedical => SignalCode::NonMedical,
    }
}

// ----------------------------------------------------------------------------
// Channels
// ----------------------------------------------------------------------------

/// Transmit-only byte channel to the actuator.
pub trait ActuatorChannel {
    fn transmit(&mut self, code: SignalCode) -> Result<(), ChannelError>;

    /// Release the underlying resource. Default is a no-op for channels with
    /// nothing to release.
    fn close(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

impl<T: ActuatorChannel + ?Sized> ActuatorChannel for Box<T> {
    fn transmit(&mut self, code: SignalCode) -> Result<(), ChannelError> {
        (**self).transmit(code)
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        (**self).close()
    }
}

/// Channel used when no serial port is configured: signals only show up in
/// the log.
#[derive(Debug, Default)]
pub struct LogOnlyChannel;

impl ActuatorChannel for LogOnlyChannel {
    fn transmit(&mut self, code: SignalCode) -> Result<(), ChannelError> {
        log::info!("signal {} (log-only channel)", code.as_str());
        Ok(())
    }
}

#[cfg(feature = "serial-actuator")]
pub use serial::SerialChannel;

#[cfg(feature = "serial-actuator")]
mod serial {
    use std::io::Write;
    use std::time::Duration;

    use super::{ActuatorChannel, SignalCode};
    use crate::error::ChannelError;

    /// Post-open settle delay so a microcontroller that resets on serial
    /// connect is listening before the first code arrives.
    const OPEN_SETTLE: Duration = Duration::from_millis(1_800);

    /// Serial-port actuator channel. The port is exclusively owned and
    /// released when the channel is dropped.
    pub struct SerialChannel {
        port: Box<dyn serialport::SerialPort>,
        name: String,
    }

    impl SerialChannel {
        pub fn open(name: &str, baud: u32) -> Result<Self, ChannelError> {
            let port = serialport::new(name, baud)
                .timeout(Duration::from_millis(100))
                .open()
                .map_err(|e| ChannelError::new(format!("open {}: {}", name, e)))?;
            std::thread::sleep(OPEN_SETTLE);
            Ok(Self {
                port,
                name: name.to_string(),
            })
        }
    }

    impl ActuatorChannel for SerialChannel {
        fn transmit(&mut self, code: SignalCode) -> Result<(), ChannelError> {
            self.port
                .write_all(&[code.byte()])
                .map_err(|e| ChannelError::new(format!("write {}: {}", self.name, e)))
        }

        fn close(&mut self) -> Result<(), ChannelError> {
            // The port itself is released on drop; flush what we can first.
            self.port
                .flush()
                .map_err(|e| ChannelError::new(format!("flush {}: {}", self.name, e)))
        }
    }
}

// ----------------------------------------------------------------------------
// Sequencer
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SequencerState {
    Idle,
    Signaled,
}

/// What one signal sequence did. Both transmissions are always attempted;
/// the caller decides what to do with individual failures.
#[derive(Debug)]
pub struct SequenceReport {
    pub primary: SignalCode,
    pub primary_result: Result<(), ChannelError>,
    pub idle_result: Result<(), ChannelError>,
}

/// Two-state dwell-then-idle sequencer.
pub struct SignalSequencer<C> {
    channel: C,
    dwell: Duration,
    state: SequencerState,
}

impl<C: ActuatorChannel> SignalSequencer<C> {
    pub fn new(channel: C, dwell: Duration) -> Self {
        Self {
            channel,
            dwell,
            state: SequencerState::Idle,
        }
    }

    /// Run one full sequence: primary code, dwell, unconditional idle reset.
    ///
    /// The dwell is the actuator's hold time; it blocks for the configured
    /// duration and must not be shortened.
    pub fn run(&mut self, outcome: Outcome) -> SequenceReport {
        debug_assert_eq!(self.state, SequencerState::Idle);
        let primary = signal_for(outcome);

        let primary_result = self.channel.transmit(primary);
        self.state = SequencerState::Signaled;

        thread::sleep(self.dwell);

        let idle_result = self.channel.transmit(SignalCode::Idle);
        self.state = SequencerState::Idle;

        SequenceReport {
            primary,
            primary_result,
            idle_result,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SequencerState::Idle
    }

    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.channel.close()
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}
