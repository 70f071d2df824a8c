//! Serial device wrapper for issuing configuration commands under `std`.

use super::ack::{AckParser, Acknowledgement};
use super::frame::{
    CfgMsgBuilder, CfgNav5Builder, CfgPrtUartBuilder, CfgRateBuilder, DynamicModel, OutputRate,
    ReceiverSettings, SentenceId, SentenceOutputs,
};
use super::{BaudRate, Transport};
use crate::error::AckError;
use std::io;
use std::time::{Duration, Instant};

/// Adapts any blocking-with-timeout reader/writer (a serial port, a pty, a
/// socket) to the byte-polling [`Transport`] contract. Read timeouts become
/// "nothing pending" rather than errors.
pub struct IoTransport<T> {
    inner: T,
}

impl<T> IoTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: io::Read + io::Write> Transport for IoTransport<T> {
    type Error = io::Error;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(bytes)?;
        self.inner.flush()
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut byte = [0u8];
        match self.inner.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }
}

/// A receiver reached over a [`Transport`], with acknowledged configuration
/// commands bounded by wall-clock time.
pub struct Device<T: Transport> {
    transport: T,
    ack_timeout: Duration,
}

impl<T: Transport> Device<T> {
    const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(transport: T) -> Self {
        Self {
            transport,
            ack_timeout: Self::DEFAULT_ACK_TIMEOUT,
        }
    }

    /// Replaces the wall-clock budget for every subsequent acknowledgement
    /// wait.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Selects the dynamic platform model.
    pub fn set_navigation_mode(&mut self, model: DynamicModel) -> Result<(), AckError<T::Error>> {
        let frame = CfgNav5Builder {
            dyn_model: model,
            ..CfgNav5Builder::default()
        }
        .into_packet_bytes();
        self.send_with_ack(&frame, CfgNav5Builder::CLASS, CfgNav5Builder::ID)
    }

    /// Selects how often the receiver computes and reports a solution.
    pub fn set_output_rate(&mut self, rate: OutputRate) -> Result<(), AckError<T::Error>> {
        let frame = CfgRateBuilder {
            measure_rate_ms: rate.period_ms(),
            ..CfgRateBuilder::default()
        }
        .into_packet_bytes();
        self.send_with_ack(&frame, CfgRateBuilder::CLASS, CfgRateBuilder::ID)
    }

    /// Enables or disables one NMEA sentence class on the current port.
    pub fn set_sentence_output(
        &mut self,
        sentence: SentenceId,
        enabled: bool,
    ) -> Result<(), AckError<T::Error>> {
        let frame = CfgMsgBuilder::sentence(sentence, enabled).into_packet_bytes();
        self.send_with_ack(&frame, CfgMsgBuilder::CLASS, CfgMsgBuilder::ID)
    }

    /// Reconfigures the UART to a new baud rate.
    ///
    /// The acknowledgement may be transmitted at the new rate and therefore
    /// be unreadable on the still-open port, so none is awaited; reopen the
    /// port at `baud` afterwards.
    pub fn set_baud_rate(&mut self, baud: BaudRate) -> Result<(), AckError<T::Error>> {
        let frame = CfgPrtUartBuilder {
            baud_rate: baud.bps(),
            ..CfgPrtUartBuilder::default()
        }
        .into_packet_bytes();
        self.transport.write_all(&frame)?;
        Ok(())
    }

    /// Applies a complete configuration: navigation mode, output rate, the
    /// sentence enable set, and the port baud rate last.
    pub fn apply(&mut self, settings: &ReceiverSettings) -> Result<(), AckError<T::Error>> {
        self.set_navigation_mode(settings.nav_mode)?;
        self.set_output_rate(settings.output_rate)?;
        for (flag, id) in SentenceOutputs::ALL_IDS {
            self.set_sentence_output(id, settings.outputs.contains(flag))?;
        }
        self.set_baud_rate(settings.baud_rate)
    }

    /// Writes `frame` and waits for its acknowledgement until the configured
    /// wall-clock budget runs out.
    pub fn send_with_ack(
        &mut self,
        frame: &[u8],
        class: u8,
        id: u8,
    ) -> Result<(), AckError<T::Error>> {
        self.transport.write_all(frame)?;

        let mut parser = AckParser::new();
        let deadline = Instant::now() + self.ack_timeout;
        while Instant::now() < deadline {
            let Some(byte) = self.transport.read_byte()? else {
                std::thread::yield_now();
                continue;
            };
            match parser.process_byte(byte) {
                Some(Acknowledgement::Ack { class: c, id: i }) if (c, i) == (class, id) => {
                    return Ok(());
                },
                Some(Acknowledgement::Nak { class: c, id: i }) if (c, i) == (class, id) => {
                    return Err(AckError::Rejected { class, id });
                },
                _ => {},
            }
        }
        Err(AckError::TimedOut)
    }
}
