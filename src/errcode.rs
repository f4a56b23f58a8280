//! ASE error codes.

use std::io;

pub type AseResult<T> = Result<T, AseError>;

quick_error! {
    #[derive(Debug)]
    pub enum AseError {
        NoFile {
            description("No file")
            display("File not found")
        }
        NotARegularFile {
            description("Not a regular file")
            display("Not a regular file")
        }

        // Document magic mismatch.  Aborts the load.
        BadMagic {
            description("Bad magic")
            display("Bad magic")
        }
        BadFrameMagic(frame: u16, magic: u16) {
            description("Bad frame magic")
            display("Frame {} has bad magic {:#06x}", frame, magic)
        }
        Truncated {
            description("Truncated")
            display("Truncated stream")
        }
        Corrupted {
            description("Corrupted")
            display("Corrupted")
        }
        BadInput {
            description("Bad input")
            display("Bad input")
        }
        ExceededLimit {
            description("Exceeded limit")
            display("Exceeded limit")
        }

        UnsupportedChunkType(magic: u16) {
            description("Unsupported chunk type")
            display("Unsupported chunk type {:#06x}", magic)
        }
        UnsupportedLayerType(layer_type: u16) {
            description("Unsupported layer type")
            display("Unsupported layer type {}", layer_type)
        }
        UnsupportedCelType(cel_type: u16) {
            description("Unsupported cel type")
            display("Unsupported cel type {}", cel_type)
        }
        DanglingLayerReference { frame: u16, layer_index: u16 } {
            description("Dangling layer reference")
            display("Frame {} refers to missing layer {}", frame, layer_index)
        }
        UnsupportedCelTarget { frame: u16, layer_index: u16 } {
            description("Unsupported cel target")
            display("Frame {} places a cel in layer {}, which does not contain images",
                    frame, layer_index)
        }
        MissingLinkedCel { frame: u16, link_frame: u16 } {
            description("Missing linked cel")
            display("Frame {} links to frame {}, which has no cel", frame, link_frame)
        }
        UnexpectedPalette {
            description("Unexpected palette")
            display("Color chunk found in a non-indexed sprite")
        }
        Compression(msg: String) {
            description("Compression stream error")
            display("Compression stream error: {}", msg)
        }

        // IO error.
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            cause(err)
        }
    }
}

/// Copyable classification of an `AseError`, as handed to warning
/// sinks.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum ErrorKind {
    NoFile,
    NotARegularFile,
    MagicMismatch,
    FrameMagicMismatch,
    TruncatedStream,
    Corrupted,
    BadInput,
    ExceededLimit,
    UnsupportedChunkType,
    UnsupportedLayerType,
    UnsupportedCelType,
    DanglingLayerReference,
    UnsupportedCelTarget,
    MissingLinkedCel,
    UnexpectedPalette,
    CompressionStreamError,
    IOError,
}

impl AseError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        use self::AseError::*;
        match *self {
            NoFile => ErrorKind::NoFile,
            NotARegularFile => ErrorKind::NotARegularFile,
            BadMagic => ErrorKind::MagicMismatch,
            BadFrameMagic(..) => ErrorKind::FrameMagicMismatch,
            Truncated => ErrorKind::TruncatedStream,
            Corrupted => ErrorKind::Corrupted,
            BadInput => ErrorKind::BadInput,
            ExceededLimit => ErrorKind::ExceededLimit,
            UnsupportedChunkType(..) => ErrorKind::UnsupportedChunkType,
            UnsupportedLayerType(..) => ErrorKind::UnsupportedLayerType,
            UnsupportedCelType(..) => ErrorKind::UnsupportedCelType,
            DanglingLayerReference { .. } => ErrorKind::DanglingLayerReference,
            UnsupportedCelTarget { .. } => ErrorKind::UnsupportedCelTarget,
            MissingLinkedCel { .. } => ErrorKind::MissingLinkedCel,
            UnexpectedPalette => ErrorKind::UnexpectedPalette,
            Compression(..) => ErrorKind::CompressionStreamError,
            Io(..) => ErrorKind::IOError,
        }
    }

    /// Returns true if the error must abort the whole load or save.
    ///
    /// Everything else is reported as a warning and recovered from at
    /// chunk granularity.
    pub fn is_fatal(&self) -> bool {
        match self.kind() {
            ErrorKind::NoFile
            | ErrorKind::NotARegularFile
            | ErrorKind::MagicMismatch
            | ErrorKind::BadInput
            | ErrorKind::ExceededLimit
            | ErrorKind::IOError => true,
            _ => false,
        }
    }
}

impl From<io::Error> for AseError {
    fn from(err: io::Error) -> AseError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            AseError::Truncated
        } else {
            AseError::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use super::{AseError,ErrorKind};

    #[test]
    fn test_unexpected_eof_is_truncation() {
        let err: AseError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(err.kind(), ErrorKind::TruncatedStream);
        assert!(!err.is_fatal());

        let err: AseError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.kind(), ErrorKind::IOError);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_magic_mismatch_is_fatal() {
        assert!(AseError::BadMagic.is_fatal());
        assert!(!AseError::BadFrameMagic(0, 0x1234).is_fatal());
        assert!(!AseError::UnsupportedChunkType(0x9999).is_fatal());
        assert!(!AseError::Compression("bad".to_string()).is_fatal());
    }
}
