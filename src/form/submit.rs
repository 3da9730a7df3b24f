use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_timer::Delay;

use super::schema::SignupRecord;

/// Rejection reported by a [`Submitter`].
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
#[error("submission failed: {message}")]
pub struct SubmissionError {
    pub message: String,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type BoxedSubmitFuture = Pin<Box<dyn Future<Output = Result<(), SubmissionError>> + Send>>;

/// Receives the validated record once a submit passes validation.
pub trait Submitter: Send + Sync + 'static {
    fn submit(&self, record: SignupRecord) -> BoxedSubmitFuture;
}

impl<F> Submitter for F
where
    F: Fn(SignupRecord) -> BoxedSubmitFuture + Send + Sync + 'static,
{
    fn submit(&self, record: SignupRecord) -> BoxedSubmitFuture {
        (self)(record)
    }
}

/// Stand-in for a network call: waits a fixed delay, logs, succeeds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DelaySubmitter {
    delay: Duration,
}

impl DelaySubmitter {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for DelaySubmitter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl Submitter for DelaySubmitter {
    fn submit(&self, record: SignupRecord) -> BoxedSubmitFuture {
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                Delay::new(delay).await;
            }
            tracing::info!(name = %record.name, email = %record.email, "form submitted");
            Ok::<(), SubmissionError>(())
        })
    }
}
