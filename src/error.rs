//! Central error types for the Fast Infoset encoder.
//!
//! Each variant references the relevant clause of ITU-T Rec. X.891 | ISO/IEC 24824-1.

use core::fmt;
use std::borrow::Cow;

/// All errors the encoder, the trace reader and the dump pipeline can report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Fast Infoset header is malformed (X.891 12.3-12.7).
    MalformedHeader,
    /// Ein IO-Fehler beim Schreiben des Fast-Infoset-Streams.
    ///
    /// Der Stream ist danach unvollständig; die Session muss mit `reset()`
    /// neu begonnen werden.
    IoError(String),
    /// Das Dokumentmodell liefert inkonsistente Daten.
    StructuralError(Cow<'static, str>),
    /// XML parsing failed.
    XmlParseError(String),
    /// An index exceeds the largest encodable integer (X.891 C.25-C.28).
    IntegerOutOfRange { value: usize, max: usize },
    /// A literal qualified name refers to a namespace name that was never
    /// declared by a namespace attribute (X.891 C.18).
    NamespaceNotIndexed(String),
    /// A literal qualified name refers to a prefix that was never declared
    /// by a namespace attribute (X.891 C.18).
    PrefixNotIndexed(String),
    /// `end_element` ohne offenes Element.
    UnbalancedEndElement,
    /// Nach `end_document` ist nur noch `reset()` erlaubt.
    DocumentFinished,
    /// The stream ended in the middle of an item (X.891 C.2).
    PrematureEndOfStream,
    /// An octet does not start any item allowed at this position (X.891 C.3).
    UnexpectedOctet {
        octet: u8,
        /// Wo das Octet gelesen wurde (leer wenn nicht verfügbar).
        context: Cow<'static, str>,
    },
    /// Character string octets are not valid in the announced encoding
    /// scheme (X.891 C.19, C.20).
    InvalidString,
    /// Rendering a message for the diagnostic dump failed.
    RenderFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHeader => write!(f, "malformed Fast Infoset header (X.891 12)"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::StructuralError(msg) => {
                if msg.is_empty() {
                    write!(f, "inconsistent document structure")
                } else {
                    write!(f, "inconsistent document structure: {msg}")
                }
            }
            Self::XmlParseError(msg) => write!(f, "XML parse error: {msg}"),
            Self::IntegerOutOfRange { value, max } => write!(
                f,
                "integer {value} exceeds maximum {max} (X.891 C.25-C.28)"
            ),
            Self::NamespaceNotIndexed(uri) => write!(
                f,
                "namespace name '{uri}' is not indexed (X.891 C.18)"
            ),
            Self::PrefixNotIndexed(prefix) => {
                write!(f, "prefix '{prefix}' is not indexed (X.891 C.18)")
            }
            Self::UnbalancedEndElement => write!(f, "end of element without open element"),
            Self::DocumentFinished => write!(f, "document already terminated, reset required"),
            Self::PrematureEndOfStream => {
                write!(f, "premature end of Fast Infoset stream (X.891 C.2)")
            }
            Self::UnexpectedOctet { octet, context } => {
                if context.is_empty() {
                    write!(f, "unexpected octet 0x{octet:02X} (X.891 C.3)")
                } else {
                    write!(f, "unexpected octet 0x{octet:02X} in {context} (X.891 C.3)")
                }
            }
            Self::InvalidString => {
                write!(f, "invalid UTF-8/UTF-16 character string (X.891 C.19, C.20)")
            }
            Self::RenderFailed(msg) => write!(f, "message rendering failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::io(e)
    }
}

impl Error {
    /// Erstellt einen `StructuralError` mit Nachricht.
    pub fn structural(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::StructuralError(msg.into())
    }

    /// Erstellt einen `UnexpectedOctet` Fehler mit Kontext.
    pub fn unexpected_octet(octet: u8, context: impl Into<Cow<'static, str>>) -> Self {
        Self::UnexpectedOctet {
            octet,
            context: context.into(),
        }
    }

    /// Wandelt einen `std::io::Error` in `IoError` um.
    pub(crate) fn io(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_header_display() {
        let msg = Error::MalformedHeader.to_string();
        assert!(msg.contains("header"), "{msg}");
        assert!(msg.contains("X.891 12"), "{msg}");
    }

    #[test]
    fn io_error_display() {
        let e = Error::IoError("disk full".to_string());
        let msg = e.to_string();
        assert!(msg.contains("IO"), "{msg}");
        assert!(msg.contains("disk full"), "{msg}");
    }

    #[test]
    fn io_conversion_keeps_message() {
        let e = Error::io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"));
        assert!(matches!(e, Error::IoError(ref m) if m.contains("pipe closed")));
    }

    #[test]
    fn structural_error_display() {
        assert_eq!(Error::structural("").to_string(), "inconsistent document structure");
        let msg = Error::structural("attribute list changed").to_string();
        assert!(msg.contains("attribute list changed"), "{msg}");
    }

    #[test]
    fn integer_out_of_range_display() {
        let e = Error::IntegerOutOfRange { value: 2_000_000, max: 1_048_576 };
        let msg = e.to_string();
        assert!(msg.contains("2000000"), "{msg}");
        assert!(msg.contains("1048576"), "{msg}");
        assert!(msg.contains("C.25"), "{msg}");
    }

    #[test]
    fn not_indexed_display() {
        let msg = Error::NamespaceNotIndexed("urn:a".into()).to_string();
        assert!(msg.contains("urn:a"), "{msg}");
        assert!(msg.contains("C.18"), "{msg}");
        let msg = Error::PrefixNotIndexed("p".into()).to_string();
        assert!(msg.contains("'p'"), "{msg}");
    }

    #[test]
    fn unexpected_octet_display() {
        let msg = Error::unexpected_octet(0x9A, "").to_string();
        assert!(msg.contains("0x9A"), "{msg}");
        let msg = Error::unexpected_octet(0x07, "attribute list").to_string();
        assert!(msg.contains("attribute list"), "{msg}");
        assert!(msg.contains("C.3"), "{msg}");
    }

    #[test]
    fn premature_end_display() {
        let msg = Error::PrematureEndOfStream.to_string();
        assert!(msg.contains("premature"), "{msg}");
    }

    #[test]
    fn invalid_string_display() {
        let msg = Error::InvalidString.to_string();
        assert!(msg.contains("UTF-16"), "{msg}");
        assert!(msg.contains("C.19"), "{msg}");
    }

    #[test]
    fn errors_are_comparable() {
        assert_eq!(Error::UnbalancedEndElement, Error::UnbalancedEndElement);
        assert_ne!(Error::DocumentFinished, Error::UnbalancedEndElement);
    }
}
