use thiserror::Error;


/// Unexpected I/O while running a test, e.g. failure to persist captured
/// output. Launch failures and comparison mismatches are not errors; they
/// are folded into the test's failure reason and the run continues.
#[derive(Debug, Error)]
pub enum TestingError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
