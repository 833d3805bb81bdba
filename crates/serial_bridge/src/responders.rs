//! Responder selection.

use std::sync::Arc;

use chat_responder::Responder;
use chat_responder_llm_api::{LlmApiResponder, LlmApiResponderConfig, LLM_API_RESPONDER_ID};
use chat_responder_mock::{MockResponder, MOCK_RESPONDER_ID};

use crate::config::BridgeEnvConfig;

pub const DEFAULT_RESPONDER_ID: &str = MOCK_RESPONDER_ID;

/// Builds the responder selected by the resolved configuration.
pub fn responder_for_config(config: &BridgeEnvConfig) -> Result<Arc<dyn Responder>, String> {
    match config.responder_id.as_str() {
        MOCK_RESPONDER_ID => Ok(Arc::new(MockResponder::default())),
        LLM_API_RESPONDER_ID => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                format!("LLM_API_KEY is required when BRIDGE_RESPONDER={LLM_API_RESPONDER_ID}")
            })?;

            let mut responder_config = LlmApiResponderConfig::new(api_key, config.model.clone());
            if let Some(base_url) = &config.base_url {
                responder_config = responder_config.with_base_url(base_url.clone());
            }

            LlmApiResponder::new(responder_config)
                .map(|responder| Arc::new(responder) as Arc<dyn Responder>)
                .map_err(|error| format!("Failed to initialize llm-api responder: {error}"))
        }
        unknown => Err(format!(
            "Unsupported responder '{unknown}'. Available responders: {MOCK_RESPONDER_ID}, {LLM_API_RESPONDER_ID}"
        )),
    }
}
