//! Error reports
//!
//! Categorized by where they happen: input / destination open / destination write

use std::fmt;
use std::io;

use thiserror::Error;

use crate::DestinationId;

/// Where in the pipeline an error report comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOrigin {
    /// The input stream
    Input,
    /// One destination
    Destination(DestinationId),
}

impl fmt::Display for ReportOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Destination(id) => id.fmt(f),
        }
    }
}

/// One failure at a named point in the pipeline.
///
/// None of these abort sibling destinations; an input failure ends delivery
/// only because nothing more can be read.
#[derive(Debug, Error)]
pub enum TeeError {
    /// Reading the input stream failed
    #[error("cannot read stdin: {source}")]
    InputRead {
        #[source]
        source: io::Error,
    },

    /// A destination could not be opened; it never receives data
    #[error("cannot open file to write: {destination}: {source}")]
    DestinationOpen {
        destination: DestinationId,
        #[source]
        source: io::Error,
    },

    /// Writing, flushing or syncing a destination failed; it is detached
    #[error("cannot write to {destination}: {source}")]
    DestinationWrite {
        destination: DestinationId,
        #[source]
        source: io::Error,
    },

    /// A pipeline task ended abnormally
    #[error("{origin} task failed: {message}")]
    TaskFailed {
        origin: ReportOrigin,
        message: String,
    },
}

impl TeeError {
    /// Create input read error
    pub fn input_read(source: io::Error) -> Self {
        Self::InputRead { source }
    }

    /// Create destination open error
    pub fn destination_open(destination: DestinationId, source: io::Error) -> Self {
        Self::DestinationOpen {
            destination,
            source,
        }
    }

    /// Create destination write error
    pub fn destination_write(destination: DestinationId, source: io::Error) -> Self {
        Self::DestinationWrite {
            destination,
            source,
        }
    }

    /// Create task failure error
    pub fn task_failed(origin: ReportOrigin, message: impl Into<String>) -> Self {
        Self::TaskFailed {
            origin,
            message: message.into(),
        }
    }

    /// Where this report comes from
    pub fn origin(&self) -> ReportOrigin {
        match self {
            Self::InputRead { .. } => ReportOrigin::Input,
            Self::DestinationOpen { destination, .. }
            | Self::DestinationWrite { destination, .. } => {
                ReportOrigin::Destination(destination.clone())
            }
            Self::TaskFailed { origin, .. } => origin.clone(),
        }
    }
}
