//! Serial bridge daemon: wires the `retroline` protocol core to a responder.
//!
//! ## Responder bootstrap
//!
//! `serial_bridge` selects its responder at startup:
//!
//! - `BRIDGE_RESPONDER=mock` for deterministic local runs (the default)
//! - `BRIDGE_RESPONDER=llm-api` for chat-completions transport
//!
//! When `BRIDGE_RESPONDER=llm-api`, set `LLM_API_KEY` to the backend
//! credential. `LLM_MODEL` and `LLM_BASE_URL` override the model id and
//! endpoint base.
//!
//! ## Link and protocol tuning
//!
//! - `BRIDGE_SERIAL_PORT`: device path, default `/dev/ttyUSB0`
//! - `BRIDGE_BAUD_RATE`: default `2400`, must be a standard rate
//! - `BRIDGE_IDLE_TIMEOUT_SEC`: silence window before the synthetic idle
//!   prompt, default `120`
//! - `BRIDGE_AUTO_MESSAGE`: `0` disables the idle prompt entirely
//! - `BRIDGE_WORD_DELAY_MS`: pacing delay per streamed word, default `200`
//!
//! ## System prompt
//!
//! `BRIDGE_SYSTEM_PROMPT_FILE` names a UTF-8 file with the system prompt;
//! `BRIDGE_SYSTEM_PROMPT` supplies it inline. The file wins when both are
//! set and readable. Unset or blank falls back to the built-in default.
//!
//! ## Logging
//!
//! Colored diagnostics go to stderr; `BRIDGE_LOG` selects the maximum level
//! (`error`, `warn`, `info`, `debug`, `trace`), default `info`.

pub mod config;
pub mod logger;
pub mod responders;
