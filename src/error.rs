use thiserror::Error;

/// Ошибки структурного декодирования и адресной арифметики.
///
/// Two irregularity families deliberately have no variant here:
/// undecodable text is recovered lossily inside the decoder, and a
/// checksum mismatch is reported as a result value so the decoded
/// structure stays available to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The input region cannot hold the structure or field being read.
    /// Covers both a short region and an exact-size violation.
    #[error("out of bounds: {context} needs {needed} bytes, region has {available}")]
    OutOfBounds {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// A conversion input violates a domain invariant (cluster < 2,
    /// sector before the data region, zero geometry parameter).
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A layout table and the record decoded from it disagree. This is a
    /// programming defect in a layout definition, not bad input data.
    #[error("decoded `{structure}` record has no `{field}` of the expected kind")]
    MissingField {
        structure: &'static str,
        field: &'static str,
    },
}

impl LayoutError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        LayoutError::InvalidArgument {
            reason: reason.into(),
        }
    }
}
