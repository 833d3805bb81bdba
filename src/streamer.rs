//! Word-paced response delivery.

use std::thread;
use std::time::Duration;

use chat_responder::{FragmentStream, ResponderError, ResponderReply};

use crate::channel::ByteChannel;
use crate::error::LinkError;

/// Fixed device-facing text for each responder failure class.
///
/// The device display is uppercase-only; these strings are transmitted
/// verbatim and recorded as the assistant turn.
#[must_use]
pub fn device_error_text(error: &ResponderError) -> String {
    match error {
        ResponderError::Auth => {
            "ERROR: INVALID API KEY. CHECK THE BRIDGE CONFIGURATION.".to_string()
        }
        ResponderError::RateLimit => "ERROR: RATE LIMIT EXCEEDED. TRY AGAIN LATER.".to_string(),
        ResponderError::Backend(message) => format!("ERROR: {}", message.to_uppercase()),
    }
}

/// Streams a responder reply as paced, upper-cased, whitespace-delimited
/// tokens.
///
/// Each token is written and flushed, then the whitespace character that
/// terminated it is written and flushed, then the pacing delay elapses. The
/// device consumes one character at a time off a narrow link; per-token
/// flushing keeps its display filling steadily instead of in bursts.
pub struct WordStreamer<'a, C: ByteChannel> {
    channel: &'a mut C,
    word_delay: Duration,
}

impl<'a, C: ByteChannel> WordStreamer<'a, C> {
    pub fn new(channel: &'a mut C, word_delay: Duration) -> Self {
        Self {
            channel,
            word_delay,
        }
    }

    /// Delivers `reply` token by token and returns the full upper-cased,
    /// trimmed response text.
    ///
    /// A partial word left when the fragments end is flushed as a final token
    /// with no trailing delay. On a mid-stream backend failure the fixed
    /// device error string is written directly instead of word-by-word and
    /// becomes the returned text.
    pub fn stream(&mut self, reply: ResponderReply) -> Result<String, LinkError> {
        let fragments: FragmentStream = match reply {
            ResponderReply::Complete(text) => Box::new(std::iter::once(Ok(text))),
            ResponderReply::Fragments(fragments) => fragments,
        };

        let mut accumulated = String::new();
        let mut pending = String::new();
        let mut started = false;

        for fragment in fragments {
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(error) => {
                    let text = device_error_text(&error);
                    self.channel.write(text.as_bytes())?;
                    self.channel.flush()?;
                    return Ok(text);
                }
            };

            accumulated.push_str(&fragment);
            for ch in fragment.chars() {
                if ch.is_whitespace() {
                    if !pending.is_empty() {
                        let token = std::mem::take(&mut pending);
                        self.write_flushed(&token)?;
                        started = true;
                    }
                    // Whitespace ahead of the first token is dropped so the
                    // transmitted stream matches the trimmed response text.
                    if started {
                        self.write_flushed(&ch.to_string())?;
                        thread::sleep(self.word_delay);
                    }
                } else {
                    pending.push(ch);
                }
            }
        }

        if !pending.is_empty() {
            self.write_flushed(&pending)?;
        }

        Ok(accumulated.trim().to_uppercase())
    }

    fn write_flushed(&mut self, text: &str) -> Result<(), LinkError> {
        self.channel.write(text.to_uppercase().as_bytes())?;
        self.channel.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chat_responder::{ResponderError, ResponderReply};

    use super::{device_error_text, WordStreamer};
    use crate::channel::testing::ScriptedChannel;

    fn stream(reply: ResponderReply) -> (String, ScriptedChannel) {
        let mut channel = ScriptedChannel::new();
        let text = WordStreamer::new(&mut channel, Duration::ZERO)
            .stream(reply)
            .expect("scripted channel never fails");
        (text, channel)
    }

    fn written(channel: &ScriptedChannel) -> Vec<String> {
        channel
            .writes
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    #[test]
    fn tokens_and_separators_are_written_individually_and_uppercased() {
        let (text, channel) = stream(ResponderReply::Complete("Hi there".to_string()));

        assert_eq!(written(&channel), vec!["HI", " ", "THERE"]);
        assert_eq!(text, "HI THERE");
        assert_eq!(channel.flushes, channel.writes.len());
    }

    #[test]
    fn fragment_boundaries_inside_words_do_not_split_tokens() {
        let reply = ResponderReply::from_fragments(vec![
            "Hel".to_string(),
            "lo wor".to_string(),
            "ld".to_string(),
        ]);
        let (text, channel) = stream(reply);

        assert_eq!(written(&channel), vec!["HELLO", " ", "WORLD"]);
        assert_eq!(text, "HELLO WORLD");
    }

    #[test]
    fn transmitted_stream_reconstructs_the_trimmed_uppercased_text() {
        let original = "  Greetings, old friend.\nAll  systems nominal. ";
        let reply = ResponderReply::Complete(original.to_string());
        let (text, channel) = stream(reply);

        assert_eq!(
            channel.written_string().trim(),
            original.trim().to_uppercase()
        );
        assert_eq!(text, original.trim().to_uppercase());
    }

    #[test]
    fn interior_whitespace_runs_are_preserved() {
        let (_, channel) = stream(ResponderReply::Complete("A  B".to_string()));
        assert_eq!(written(&channel), vec!["A", " ", " ", "B"]);
    }

    #[test]
    fn trailing_partial_word_is_flushed_as_final_token() {
        let reply = ResponderReply::from_fragments(vec!["one ".to_string(), "two".to_string()]);
        let (text, channel) = stream(reply);

        assert_eq!(written(&channel), vec!["ONE", " ", "TWO"]);
        assert_eq!(text, "ONE TWO");
    }

    #[test]
    fn empty_reply_writes_nothing() {
        let (text, channel) = stream(ResponderReply::Complete(String::new()));
        assert!(channel.writes.is_empty());
        assert!(text.is_empty());
    }

    #[test]
    fn mid_stream_failure_writes_the_device_error_string_directly() {
        let fragments: chat_responder::FragmentStream = Box::new(
            vec![
                Ok("Partial ".to_string()),
                Err(ResponderError::Backend("stream reset".to_string())),
            ]
            .into_iter(),
        );
        let (text, channel) = stream(ResponderReply::Fragments(fragments));

        assert_eq!(text, "ERROR: STREAM RESET");
        let last = written(&channel).last().cloned().unwrap_or_default();
        assert_eq!(last, "ERROR: STREAM RESET");
    }

    #[test]
    fn device_error_strings_are_distinct_and_uppercase() {
        let auth = device_error_text(&ResponderError::Auth);
        let rate = device_error_text(&ResponderError::RateLimit);
        let backend = device_error_text(&ResponderError::Backend("boom".to_string()));

        assert_ne!(auth, rate);
        for text in [&auth, &rate, &backend] {
            assert_eq!(*text, text.to_uppercase());
        }
        assert_eq!(backend, "ERROR: BOOM");
    }
}
