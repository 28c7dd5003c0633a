use std::future::Future;
use std::time::Duration;

/// How many extra attempts to make after a failure, and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(retries: usize, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn max_attempts(&self) -> usize {
        self.retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(1))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempt(s): {last}")]
pub struct ExhaustedRetriesError<E: std::error::Error + 'static> {
    pub attempts: usize,
    #[source]
    pub last: E,
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// Attempts run one after another. `op` receives the 1-based attempt number.
/// The delay is a tokio sleep, so it does not block the runtime, and it only
/// happens between attempts.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ExhaustedRetriesError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                log::warn!("Attempt {}/{} failed: {}. Retrying...", attempt, max_attempts, err);
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => {
                log::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, err);
                return Err(ExhaustedRetriesError {
                    attempts: attempt,
                    last: err,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("boom #{0}")]
    struct Boom(usize);

    #[tokio::test(start_paused = true)]
    async fn first_success_returns_immediately() {
        let calls = Cell::new(0);
        let started = Instant::now();

        let result = retry(RetryPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            async { Ok::<_, Boom>("quiz") }
        })
        .await;

        assert_eq!(result.unwrap(), "quiz");
        assert_eq!(calls.get(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_the_delay() {
        let calls = Cell::new(0);
        let started = Instant::now();

        let result = retry(RetryPolicy::default(), |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt == 1 {
                    Err(Boom(attempt))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_with_last_error() {
        let calls = Cell::new(0);
        let started = Instant::now();

        let err = retry(RetryPolicy::default(), |attempt| {
            calls.set(calls.get() + 1);
            async move { Err::<(), _>(Boom(attempt)) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.get(), 2);
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last, Boom(2));
        // One delay between the two attempts, none after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let calls = Cell::new(0);

        let err = retry(RetryPolicy::new(0, Duration::from_secs(5)), |attempt| {
            calls.set(calls.get() + 1);
            async move { Err::<(), _>(Boom(attempt)) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert_eq!(err.attempts, 1);
    }

    #[test]
    fn error_message_names_attempts_and_cause() {
        let err = ExhaustedRetriesError {
            attempts: 2,
            last: Boom(2),
        };

        assert_eq!(err.to_string(), "gave up after 2 attempt(s): boom #2");
    }
}
