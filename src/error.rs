use thiserror::Error;

/// Errors produced while mapping a GPX document.
///
/// Any error aborts the whole parse; there is no partial-document result.
#[derive(Debug, Error)]
pub enum GpxError {
    /// Malformed XML, reported by the underlying reader and passed through.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The root element's version attribute is not exactly "1.1".
    #[error("unsupported GPX version '{found}', expected '1.1'")]
    UnsupportedVersion { found: String },

    /// A required attribute is absent.
    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An attribute or element expected to hold a number contains text that
    /// does not parse as one.
    #[error("invalid numeric value '{value}' for '{field}' on <{element}>")]
    InvalidNumber {
        element: &'static str,
        field: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, GpxError>;
