use llm_api::{normalize_chat_url, LlmApiClient, LlmApiConfig};

#[test]
fn empty_input_uses_the_default_base_url() {
    assert_eq!(
        normalize_chat_url(""),
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(
        normalize_chat_url("   "),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn complete_endpoints_pass_through_unchanged() {
    assert_eq!(
        normalize_chat_url("https://proxy.local/v1/chat/completions"),
        "https://proxy.local/v1/chat/completions"
    );
}

#[test]
fn partial_paths_are_completed() {
    assert_eq!(
        normalize_chat_url("https://proxy.local/v1/chat/"),
        "https://proxy.local/v1/chat/completions"
    );
    assert_eq!(
        normalize_chat_url("https://proxy.local/v1"),
        "https://proxy.local/v1/chat/completions"
    );
}

#[test]
fn client_normalizes_its_configured_base_url() {
    let client = LlmApiClient::new(LlmApiConfig::new("key", "model"))
        .expect("config with key and model is valid");
    assert_eq!(
        client.normalized_endpoint(),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn blank_credentials_are_rejected_at_construction() {
    assert!(LlmApiClient::new(LlmApiConfig::new("", "model")).is_err());
    assert!(LlmApiClient::new(LlmApiConfig::new("key", " ")).is_err());
}

#[test]
fn unparseable_base_urls_are_rejected_at_construction() {
    let config = LlmApiConfig::new("key", "model").with_base_url("not a url");
    let error = LlmApiClient::new(config)
        .err()
        .expect("bad base URL should be rejected");
    assert!(matches!(error, llm_api::LlmApiError::InvalidBaseUrl(_)));
}
