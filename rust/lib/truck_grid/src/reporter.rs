use tracing::error;

use crate::error::ApiError;

/// Title used for every failure the store reports.
pub const ERROR_TITLE: &str = "Error";

/// Surfaces a failure to the user.
///
/// Called synchronously from the store after a failed remote call. The
/// store ignores whatever the implementation does with it.
pub trait ErrorReporter: Send + Sync + 'static {
    fn notify(&self, title: &str, error: &ApiError);
}

/// Reporter that only writes the failure to the log.
///
/// Used by headless front-ends (the CLI) that have no dialog to open.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn notify(&self, title: &str, error: &ApiError) {
        error!(title, %error, "truck service call failed");
    }
}
