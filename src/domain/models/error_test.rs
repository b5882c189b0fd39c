use anyhow::anyhow;
use strum::IntoEnumIterator;

use super::ChatError;
use super::ChatErrorKind;

#[test]
fn it_maps_status_codes() {
    let res = ChatErrorKind::iter()
        .map(|kind| {
            return format!("{kind}: {}", kind.status_code());
        })
        .collect::<Vec<String>>()
        .join("\n");

    insta::assert_snapshot!(res, @r###"
    invalid_input: 400
    not_configured: 503
    timeout: 504
    rate_limited: 429
    content_blocked: 400
    network_error: 503
    upstream_error: 500
    "###);
}

#[test]
fn it_only_auto_retries_transient_failures() {
    let retried = ChatErrorKind::iter()
        .filter(|kind| return kind.is_auto_retryable())
        .collect::<Vec<ChatErrorKind>>();

    assert_eq!(
        retried,
        vec![
            ChatErrorKind::Timeout,
            ChatErrorKind::NetworkError,
            ChatErrorKind::UpstreamError
        ]
    );
}

#[test]
fn it_allows_manual_retry_after_rate_limits() {
    assert!(ChatErrorKind::RateLimited.is_manually_retryable());
    assert!(!ChatErrorKind::RateLimited.is_auto_retryable());
    assert!(!ChatErrorKind::InvalidInput.is_manually_retryable());
    assert!(!ChatErrorKind::ContentBlocked.is_manually_retryable());
    assert!(!ChatErrorKind::NotConfigured.is_manually_retryable());
}

#[test]
fn it_guesses_kind_from_status() {
    assert_eq!(ChatErrorKind::from_status(429), ChatErrorKind::RateLimited);
    assert_eq!(ChatErrorKind::from_status(503), ChatErrorKind::NetworkError);
    assert_eq!(ChatErrorKind::from_status(504), ChatErrorKind::Timeout);
    assert_eq!(ChatErrorKind::from_status(502), ChatErrorKind::UpstreamError);
    assert_eq!(ChatErrorKind::from_status(400), ChatErrorKind::InvalidInput);
}

#[test]
fn it_serializes_as_snake_case() -> anyhow::Result<()> {
    let res = serde_json::to_string(&ChatErrorKind::NotConfigured)?;
    assert_eq!(res, "\"not_configured\"");

    let kind: ChatErrorKind = serde_json::from_str("\"rate_limited\"")?;
    assert_eq!(kind, ChatErrorKind::RateLimited);

    return Ok(());
}

mod classify {
    use super::*;

    #[test]
    fn it_keeps_typed_errors() {
        let err: anyhow::Error = ChatError::new(ChatErrorKind::ContentBlocked, "nope").into();
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::ContentBlocked);
    }

    #[test]
    fn it_matches_api_key_failures() {
        let err = anyhow!("Invalid API Key provided");
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::NotConfigured);
    }

    #[test]
    fn it_matches_quota_failures() {
        let err = anyhow!("You exceeded your current quota");
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::RateLimited);
    }

    #[test]
    fn it_matches_safety_failures() {
        let err = anyhow!("Response was blocked due to SAFETY");
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::ContentBlocked);
    }

    #[test]
    fn it_matches_network_failures() {
        let err = anyhow!("fetch failed");
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::NetworkError);
    }

    #[test]
    fn it_defaults_to_upstream_errors() {
        let err = anyhow!("Empty response from AI");
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::UpstreamError);
    }

    #[tokio::test]
    async fn it_matches_connection_failures() {
        // Nothing listens on port 9 of localhost.
        let res = reqwest::Client::new().get("http://127.0.0.1:9").send().await;
        let err: anyhow::Error = res.unwrap_err().into();
        assert_eq!(ChatErrorKind::classify(&err), ChatErrorKind::NetworkError);
    }
}
