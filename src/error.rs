//! Error types.
//!
//! - `PanoError` is the library taxonomy: callers match on it to decide
//!   whether a failure is fatal (empty arcade, bad control polygon) or
//!   recoverable (degenerate tangent, non-convergent fit).
//! - `AppError` is what the `pano` binary reports: a message plus a process
//!   exit code.

/// Failures raised by the panoramic core.
#[derive(Debug, Clone, PartialEq)]
pub enum PanoError {
    /// No foreground pixels survive thresholding / component selection.
    EmptyArcade,
    /// Control-point array with odd length or fewer than two points.
    InvalidControlPolygon { len: usize },
    /// Zero-magnitude derivative at sample `index` while normalizing tangents.
    DegenerateTangent { index: usize },
    /// Optimizer hit its iteration cap without meeting tolerance.
    NonConvergentFit { iterations: usize, objective: f64 },
    /// Parameter validation failure (sizes, lengths, non-finite values).
    InvalidInput(String),
}

impl PanoError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PanoError::InvalidInput(message.into())
    }
}

impl std::fmt::Display for PanoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanoError::EmptyArcade => {
                write!(f, "No dental arcade found: the thresholded slice has no usable foreground.")
            }
            PanoError::InvalidControlPolygon { len } => write!(
                f,
                "Invalid control polygon: expected an even number (>= 4) of coordinates, got {len}."
            ),
            PanoError::DegenerateTangent { index } => {
                write!(f, "Degenerate tangent: zero-length derivative at sample {index}.")
            }
            PanoError::NonConvergentFit {
                iterations,
                objective,
            } => write!(
                f,
                "Curve fit did not converge after {iterations} iterations (objective {objective:.6})."
            ),
            PanoError::InvalidInput(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for PanoError {}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PanoError> for AppError {
    fn from(err: PanoError) -> Self {
        let exit_code = match err {
            PanoError::InvalidInput(_) | PanoError::InvalidControlPolygon { .. } => 2,
            PanoError::EmptyArcade => 3,
            PanoError::DegenerateTangent { .. } | PanoError::NonConvergentFit { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pano_errors_map_to_exit_codes() {
        assert_eq!(AppError::from(PanoError::invalid("bad")).exit_code(), 2);
        assert_eq!(AppError::from(PanoError::EmptyArcade).exit_code(), 3);
        assert_eq!(
            AppError::from(PanoError::DegenerateTangent { index: 7 }).exit_code(),
            4
        );
    }

    #[test]
    fn invalid_polygon_message_mentions_length() {
        let msg = PanoError::InvalidControlPolygon { len: 3 }.to_string();
        assert!(msg.contains('3'), "unexpected message: {msg}");
    }
}
