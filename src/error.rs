//! Driver error type.
//!
//! An [`Error`] is a kind plus a short trail of the operations it travelled
//! through, innermost first. Two commands routed through the same transport
//! primitive can therefore still be told apart by whoever ends up holding the
//! error (`SendCommand <- Startup` versus `SendCommand <- ExitingSleep`).

use core::fmt;

use heapless::Vec;

/// Maximum number of operations recorded in an error trail.
pub const TRAIL_DEPTH: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The SPI port has been released from the session.
    NoTransport,
    /// A parameter count was given without (enough) parameter bytes.
    InvalidParameters,
    /// More parameters than [`crate::command::MAX_PARAMETERS`].
    TooManyParameters,
    /// A command byte wait loop ran out of time.
    Timeout,
    /// The DMA channel reported a transfer error.
    DmaError,
    /// No completion signal arrived for a chunk in time.
    TransferTimeout,
    /// Orientation value outside of the four supported ones.
    InvalidOrientation,
    /// An entry of the configuration script failed.
    CommandFailed,
    /// The software reset command failed.
    ResetFailed,
    /// Window addressing attempted before any orientation was applied.
    NoOrientation,
    /// Window outside the logical display area, or empty.
    OutOfBounds,
    /// A GPIO line (D/C, backlight, chip select) refused a level change.
    Pin,
    /// Rendering requested while the controller is not idle.
    NotReady,
    /// The request queue has no free slot.
    QueueFull,
}

impl ErrorKind {
    /// Transport or peripheral failures: the SPI/DMA path can no longer be
    /// trusted. Everything else is a rejected request.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::NoTransport
                | ErrorKind::Timeout
                | ErrorKind::DmaError
                | ErrorKind::TransferTimeout
                | ErrorKind::CommandFailed
                | ErrorKind::ResetFailed
                | ErrorKind::Pin
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NoTransport => "no transport bound",
            ErrorKind::InvalidParameters => "invalid parameters",
            ErrorKind::TooManyParameters => "too many parameters",
            ErrorKind::Timeout => "transport timeout",
            ErrorKind::DmaError => "DMA transfer error",
            ErrorKind::TransferTimeout => "DMA transfer timeout",
            ErrorKind::InvalidOrientation => "invalid orientation",
            ErrorKind::CommandFailed => "configuration command failed",
            ErrorKind::ResetFailed => "reset failed",
            ErrorKind::NoOrientation => "no orientation applied",
            ErrorKind::OutOfBounds => "window out of bounds",
            ErrorKind::Pin => "GPIO line error",
            ErrorKind::NotReady => "controller not ready",
            ErrorKind::QueueFull => "request queue full",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of the driver operation an error passed through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    SendCommand,
    StreamPixels,
    SetWindow,
    SetOrientation,
    Startup,
    ExitingSleep,
    Configuring,
    Backlight,
    FillRect,
    WriteWindow,
    DrawGlyphs,
    DrawIcon,
    Request,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::SendCommand => "send_command",
            Operation::StreamPixels => "stream_pixels",
            Operation::SetWindow => "set_window",
            Operation::SetOrientation => "set_orientation",
            Operation::Startup => "startup",
            Operation::ExitingSleep => "exiting_sleep",
            Operation::Configuring => "configuring",
            Operation::Backlight => "backlight",
            Operation::FillRect => "fill_rect",
            Operation::WriteWindow => "write_window",
            Operation::DrawGlyphs => "draw_glyphs",
            Operation::DrawIcon => "draw_icon",
            Operation::Request => "request",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    cause: Option<ErrorKind>,
    trail: Vec<Operation, TRAIL_DEPTH>,
}

impl Error {
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind, cause: None, trail: Vec::new() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Kind of the lowest-level failure, when this error wraps another one.
    pub fn cause(&self) -> Option<ErrorKind> {
        self.cause
    }

    /// Operations the error went through, innermost first.
    pub fn trail(&self) -> &[Operation] {
        &self.trail
    }

    /// Record the operation the error is propagating through.
    /// A full trail keeps its innermost entries.
    pub fn context(mut self, op: Operation) -> Self {
        let _ = self.trail.push(op);
        self
    }

    /// Re-label the error with a higher-level kind, keeping the previous
    /// kind as the cause.
    pub fn wrap(mut self, kind: ErrorKind) -> Self {
        self.cause = self.cause.or(Some(self.kind));
        self.kind = kind;
        self
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind || self.cause == Some(kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        for (i, op) in self.trail.iter().enumerate() {
            let sep = if i == 0 { " (in " } else { " <- " };
            write!(f, "{}{}", sep, op)?;
        }
        if !self.trail.is_empty() {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// `?`-friendly way of pushing an [`Operation`] onto an error trail.
pub trait ResultExt<T> {
    fn context(self, op: Operation) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    #[inline]
    fn context(self, op: Operation) -> Result<T, Error> {
        self.map_err(|e| e.into().context(op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_records_innermost_first() {
        let err: Result<(), Error> = Err(ErrorKind::Timeout.into());
        let err = err
            .context(Operation::SendCommand)
            .context(Operation::Startup)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.trail(), &[Operation::SendCommand, Operation::Startup]);
    }

    #[test]
    fn wrap_keeps_root_cause() {
        let err = Error::new(ErrorKind::Timeout)
            .context(Operation::SendCommand)
            .wrap(ErrorKind::ResetFailed)
            .wrap(ErrorKind::CommandFailed);
        assert_eq!(err.kind(), ErrorKind::CommandFailed);
        assert_eq!(err.cause(), Some(ErrorKind::Timeout));
        assert!(err.is(ErrorKind::Timeout));
        assert!(!err.is(ErrorKind::ResetFailed));
    }

    #[test]
    fn full_trail_drops_outer_operations() {
        let mut err = Error::new(ErrorKind::DmaError);
        for _ in 0..TRAIL_DEPTH {
            err = err.context(Operation::StreamPixels);
        }
        err = err.context(Operation::Request);
        assert_eq!(err.trail().len(), TRAIL_DEPTH);
        assert!(err.trail().iter().all(|op| *op == Operation::StreamPixels));
    }

    #[test]
    fn display_lists_the_trail() {
        let err = Error::new(ErrorKind::Timeout)
            .context(Operation::SendCommand)
            .context(Operation::Startup)
            .wrap(ErrorKind::ResetFailed);
        assert_eq!(
            err.to_string(),
            "reset failed: transport timeout (in send_command <- startup)"
        );
    }
}
