//! Application error type.
//!
//! Every fallible stage returns `AppError`. The exit code encodes the error class
//! so scripts can tell a bad input file from an empty join or a full disk.

/// Process setup failure (logging could not be installed).
pub const EXIT_INTERNAL: u8 = 1;
/// Missing file, malformed CSV, missing column, invalid flag value.
pub const EXIT_INPUT: u8 = 2;
/// No overlapping months, not enough rows for the window/lag/split.
pub const EXIT_DATA: u8 = 3;
/// Output directory or artifact not writable.
pub const EXIT_OUTPUT: u8 = 4;
/// Model fit/predict failure or an incompatible model file.
pub const EXIT_MODEL: u8 = 5;

#[derive(Clone, PartialEq, Eq)]
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

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::new(EXIT_MODEL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
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
