//! Transport retry for clinic API calls.
//!
//! Connect errors and timeouts are retried with a doubling delay. Any HTTP
//! response ends the loop, including 4xx/5xx, so the caller maps it.

use std::future::Future;
use std::time::Duration;

/// Delay before the first retry; doubles after each one.
const FIRST_DELAY: Duration = Duration::from_millis(200);

/// Send a request, retrying transport failures up to `max_retries` times.
pub(crate) async fn send_with_retry<F, Fut>(
    endpoint: &str,
    max_retries: u32,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut delay = FIRST_DELAY;
    let mut retries = 0;
    loop {
        let err = match send().await {
            Ok(resp) => return Ok(resp),
            Err(err) if retries >= max_retries => return Err(err),
            Err(err) => err,
        };
        retries += 1;
        tracing::warn!(
            endpoint,
            retry = retries,
            max_retries,
            timed_out = err.is_timeout(),
            error = %err,
            "clinic API unreachable, retrying in {delay:?}"
        );
        tokio::time::sleep(delay).await;
        delay *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn count_sends(url: String, max_retries: u32) -> (bool, u32) {
        let sends = AtomicU32::new(0);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let result = send_with_retry("GET /test", max_retries, || {
            sends.fetch_add(1, Ordering::SeqCst);
            http.get(url.as_str()).send()
        })
        .await;

        (result.is_ok(), sends.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn transport_failure_uses_configured_retries() {
        let closed = "http://127.0.0.1:1/".to_string();

        assert_eq!(count_sends(closed.clone(), 0).await, (false, 1));
        assert_eq!(count_sends(closed, 2).await, (false, 3));
    }

    #[tokio::test]
    async fn error_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(count_sends(server.uri(), 3).await, (true, 1));
    }
}
