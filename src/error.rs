//! Error types for parsing, layout and rendering.
//!
//! Every fallible operation in the crate returns [`RenderError`]. The CLI
//! turns any variant into a single diagnostic line and exit code 1.

use std::io;

use thiserror::Error;

/// The main error type for diagram rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The diagram source does not match the flowchart grammar.
    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// The graph could not be positioned.
    #[error("Layout error: {0}")]
    Layout(String),

    /// A theme name is not in the registry.
    #[error("Unknown theme \"{0}\". Use --list-themes to see available themes.")]
    Theme(String),

    /// Command-line misuse: bad mode, missing input, bad option value.
    #[error("{0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    /// Create a `Syntax` error for the given 1-based source line.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Create a `Usage` error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_names_the_line() {
        let err = RenderError::syntax(3, "dangling edge");
        assert_eq!(err.to_string(), "Syntax error on line 3: dangling edge");
    }

    #[test]
    fn theme_error_points_at_list_themes() {
        let err = RenderError::Theme("nope".to_string());
        assert!(err.to_string().contains("\"nope\""));
        assert!(err.to_string().contains("--list-themes"));
    }

    #[test]
    fn io_errors_convert() {
        let err: RenderError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, RenderError::Io(_)));
    }
}
