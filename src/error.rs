use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadSequences,
    ComputeProperties,
    WriteTables,
    PlotMolecularWeight,
    PlotIsoelectricPoint,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LoadSequences => "sequence loading",
            Stage::ComputeProperties => "property calculation",
            Stage::WriteTables => "table writing",
            Stage::PlotMolecularWeight => "molecular weight boxplot",
            Stage::PlotIsoelectricPoint => "isoelectric point boxplot",
        };
        f.write_str(name)
    }
}

/// Coarse error taxonomy used by callers that only care about the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Computation,
    EmptyData,
    Render,
    Config,
}

#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid sequence at position {position}: {message}")]
    InvalidSequence { position: usize, message: String },

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("No data: {0}")]
    EmptyData(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PropertyError>,
    },
}

/// Type alias for Result with PropertyError
pub type Result<T> = std::result::Result<T, PropertyError>;

impl PropertyError {
    /// Create a new InvalidSequence error
    pub fn invalid_sequence(position: usize, message: impl Into<String>) -> Self {
        PropertyError::InvalidSequence {
            position,
            message: message.into(),
        }
    }

    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        PropertyError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Wrap this error with the pipeline stage it came from
    pub fn in_stage(self, stage: Stage) -> Self {
        PropertyError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was raised in, if it went through the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PropertyError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PropertyError::Io(_) | PropertyError::FileNotFound(_) => ErrorKind::Io,
            PropertyError::InvalidFileFormat(_) | PropertyError::DataError(_) => ErrorKind::Parse,
            PropertyError::InvalidSequence { .. } => ErrorKind::Computation,
            PropertyError::EmptyData(_) => ErrorKind::EmptyData,
            PropertyError::Render(_) => ErrorKind::Render,
            PropertyError::InvalidParameter { .. } => ErrorKind::Config,
            PropertyError::Stage { source, .. } => source.kind(),
        }
    }
}
