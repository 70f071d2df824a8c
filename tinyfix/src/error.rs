use core::fmt;

/// Error converting the packed date/time fields of a fix into a calendar
/// date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeError {
    InvalidDate,
    InvalidTime,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeError::InvalidDate => f.write_str("invalid date"),
            DateTimeError::InvalidTime => f.write_str("invalid time"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DateTimeError {}

/// Error that is possible while waiting for a command acknowledgement
#[derive(Debug, PartialEq)]
pub enum AckError<E> {
    /// The receiver answered with ACK-NAK for the given class/id.
    Rejected { class: u8, id: u8 },
    /// The poll budget ran out before a matching acknowledgement arrived.
    /// The command is presumed unacknowledged; re-issuing is up to the caller.
    TimedOut,
    /// The underlying transport failed while sending or polling.
    Transport(E),
}

impl<E> From<E> for AckError<E> {
    fn from(e: E) -> Self {
        AckError::Transport(e)
    }
}

impl<E> fmt::Display for AckError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckError::Rejected { class, id } => {
                write!(f, "command rejected (NAK) for class {class:#04x} id {id:#04x}")
            },
            AckError::TimedOut => f.write_str("timed out waiting for acknowledgement"),
            AckError::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for AckError<E> where E: std::error::Error {}
