//! Single-threaded cooperative bridge loop.
//!
//! One loop polls the channel, runs the framer, runs the idle check, and,
//! when a message frames, performs the blocking responder call and paced
//! streaming inline. The device only ever has one outstanding request, so
//! nothing here needs synchronization; history is mutated only after a full
//! response (or its error text) is in hand, so an abandoned in-flight
//! response cannot corrupt state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chat_responder::Responder;
use log::{debug, info, warn};

use crate::channel::ByteChannel;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::framer::{Frame, Framer};
use crate::session::{MessageOrigin, Session};
use crate::streamer::{device_error_text, WordStreamer};
use crate::wire::{ACK_BYTE, ACK_REPEATS, ACK_REPEAT_DELAY, TERMINATOR_BYTE};

/// Orchestrates channel, framer, session, responder and streamer.
pub struct Bridge<C: ByteChannel> {
    channel: C,
    responder: Arc<dyn Responder>,
    config: BridgeConfig,
    framer: Framer,
    session: Session,
}

impl<C: ByteChannel> Bridge<C> {
    pub fn new(
        channel: C,
        responder: Arc<dyn Responder>,
        system_prompt: impl Into<String>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            channel,
            responder,
            config,
            framer: Framer::new(),
            session: Session::new(system_prompt, Instant::now()),
        }
    }

    /// Runs the poll loop until `stop` is set or the link fails.
    ///
    /// `stop` is checked once per iteration, so an external interrupt takes
    /// effect after the current poll (and any in-flight response) completes.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), BridgeError> {
        info!("bridge loop started, waiting for device handshake");
        while !stop.load(Ordering::SeqCst) {
            self.poll_once(Instant::now())?;
            thread::sleep(self.config.poll_interval);
        }
        info!("bridge loop stopped");
        Ok(())
    }

    /// One poll iteration: read, classify at most one frame, then the idle
    /// check. Handshake classification always precedes message extraction.
    pub fn poll_once(&mut self, now: Instant) -> Result<(), BridgeError> {
        let bytes = if self.channel.bytes_available()? > 0 {
            self.channel.read_available()?
        } else {
            Vec::new()
        };
        match self.framer.feed(&bytes) {
            Some(Frame::Handshake) => self.on_handshake(now)?,
            Some(Frame::Message(text)) => self.on_message(text, MessageOrigin::Remote)?,
            Some(Frame::Malformed(text)) => debug!("discarding unframed line: {text:?}"),
            None => {}
        }

        let idle_prompt =
            self.session
                .idle_prompt_due(self.config.idle_timeout, self.config.auto_message, now);
        if let Some(prompt) = idle_prompt {
            self.on_message(prompt.to_string(), MessageOrigin::Idle)?;
        }

        Ok(())
    }

    /// Read-only view of the session, for diagnostics and tests.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn on_handshake(&mut self, now: Instant) -> Result<(), BridgeError> {
        info!("device handshake received, acknowledging");
        for repeat in 0..ACK_REPEATS {
            self.channel.write(&[ACK_BYTE])?;
            self.channel.flush()?;
            if repeat + 1 < ACK_REPEATS {
                thread::sleep(ACK_REPEAT_DELAY);
            }
        }

        self.session.on_handshake(now);
        Ok(())
    }

    fn on_message(&mut self, text: String, origin: MessageOrigin) -> Result<(), BridgeError> {
        if !self.session.is_connected() {
            debug!("dropping message before handshake: {text:?}");
            return Ok(());
        }
        if origin == MessageOrigin::Remote {
            debug!("device message: {text:?}");
        }

        self.session.push_user(text);

        let response = match self.responder.respond(self.session.conversation()) {
            Ok(reply) => {
                WordStreamer::new(&mut self.channel, self.config.word_delay).stream(reply)?
            }
            Err(error) => {
                warn!("responder failed: {error}");
                let text = device_error_text(&error);
                self.channel.write(text.as_bytes())?;
                self.channel.flush()?;
                text
            }
        };

        self.session.push_assistant(response);
        self.channel.write(&[TERMINATOR_BYTE])?;
        self.channel.flush()?;
        self.session.mark_activity(Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use chat_responder::Role;
    use chat_responder_mock::{MockResponder, ReplyScript};

    use super::Bridge;
    use crate::channel::testing::ScriptedChannel;
    use crate::config::BridgeConfig;
    use crate::wire::{ACK_BYTE, ACK_REPEATS, HANDSHAKE_MARKER, TERMINATOR_BYTE};

    fn test_config() -> BridgeConfig {
        BridgeConfig::new()
            .with_word_delay(Duration::ZERO)
            .with_idle_timeout(Duration::from_secs(60))
    }

    fn bridge_with(script: Vec<ReplyScript>) -> Bridge<ScriptedChannel> {
        Bridge::new(
            ScriptedChannel::new(),
            Arc::new(MockResponder::new(script)),
            "be helpful",
            test_config(),
        )
    }

    fn handshake(bridge: &mut Bridge<ScriptedChannel>, now: Instant) {
        bridge.channel.push_read(HANDSHAKE_MARKER.as_bytes());
        bridge.poll_once(now).expect("handshake poll should succeed");
    }

    #[test]
    fn handshake_sends_the_ack_burst_and_resets_history() {
        let now = Instant::now();
        let mut bridge = bridge_with(Vec::new());
        handshake(&mut bridge, now);

        let acks: Vec<&Vec<u8>> = bridge
            .channel
            .writes
            .iter()
            .filter(|bytes| bytes.as_slice() == [ACK_BYTE])
            .collect();
        assert_eq!(acks.len(), ACK_REPEATS as usize);
        assert_eq!(bridge.channel.flushes, ACK_REPEATS as usize);
        assert_eq!(bridge.session().conversation().len(), 1);
        assert!(bridge.session().is_connected());
    }

    #[test]
    fn message_round_trip_streams_words_and_updates_history() {
        let now = Instant::now();
        let mut bridge = bridge_with(vec![ReplyScript::Complete("Hi there".to_string())]);
        handshake(&mut bridge, now);
        bridge.channel.writes.clear();

        bridge.channel.push_read(b"MSG:HELLO\r");
        bridge
            .poll_once(now + Duration::from_millis(100))
            .expect("message poll should succeed");

        let writes: Vec<Vec<u8>> = bridge.channel.writes.clone();
        assert_eq!(
            writes,
            vec![
                b"HI".to_vec(),
                b" ".to_vec(),
                b"THERE".to_vec(),
                vec![TERMINATOR_BYTE],
            ]
        );

        let turns = bridge.session().conversation();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].text, "HELLO");
        assert_eq!(turns[2].role, Role::Assistant);
        assert_eq!(turns[2].text, "HI THERE");
    }

    #[test]
    fn responder_failure_is_transmitted_and_recorded_without_killing_the_loop() {
        let now = Instant::now();
        let mut bridge = bridge_with(vec![
            ReplyScript::Fail(chat_responder::ResponderError::Auth),
            ReplyScript::Complete("Still here".to_string()),
        ]);
        handshake(&mut bridge, now);
        bridge.channel.writes.clear();

        bridge.channel.push_read(b"MSG:HELLO\r");
        bridge.poll_once(now).expect("auth failure must not be fatal");

        let expected = "ERROR: INVALID API KEY. CHECK THE BRIDGE CONFIGURATION.";
        assert_eq!(bridge.channel.writes[0], expected.as_bytes().to_vec());
        assert_eq!(*bridge.channel.writes.last().expect("terminator"), vec![
            TERMINATOR_BYTE
        ]);
        assert_eq!(bridge.session().conversation()[2].text, expected);

        // The loop keeps serving after the failure.
        bridge.channel.push_read(b"MSG:AGAIN\r");
        bridge.poll_once(now).expect("next message should succeed");
        assert_eq!(bridge.session().conversation()[4].text, "STILL HERE");
    }

    #[test]
    fn malformed_lines_produce_no_writes_and_no_history() {
        let now = Instant::now();
        let mut bridge = bridge_with(Vec::new());
        handshake(&mut bridge, now);
        bridge.channel.writes.clear();

        bridge.channel.push_read(b"line noise\r");
        bridge.poll_once(now).expect("malformed poll should succeed");

        assert!(bridge.channel.writes.is_empty());
        assert_eq!(bridge.session().conversation().len(), 1);
    }

    #[test]
    fn messages_before_any_handshake_are_dropped() {
        let now = Instant::now();
        let mut bridge = bridge_with(Vec::new());

        bridge.channel.push_read(b"MSG:HELLO\r");
        bridge.poll_once(now).expect("poll should succeed");

        assert!(bridge.channel.writes.is_empty());
        assert_eq!(bridge.session().conversation().len(), 1);
    }

    #[test]
    fn idle_prompt_flows_through_the_normal_message_path_once() {
        let now = Instant::now();
        let mut bridge = bridge_with(vec![ReplyScript::Complete("Anyone home?".to_string())]);
        handshake(&mut bridge, now);
        bridge.channel.writes.clear();

        let late = now + Duration::from_secs(120);
        bridge.poll_once(late).expect("idle poll should succeed");

        let turns = bridge.session().conversation();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].text, crate::wire::IDLE_PROMPT);
        assert_eq!(turns[2].text, "ANYONE HOME?");

        // A second idle window must not fire again before the next handshake.
        bridge.channel.writes.clear();
        bridge
            .poll_once(late + Duration::from_secs(600))
            .expect("quiet poll should succeed");
        assert!(bridge.channel.writes.is_empty());
    }

    #[test]
    fn reconnection_handshake_discards_accumulated_history() {
        let now = Instant::now();
        let mut bridge = bridge_with(vec![ReplyScript::Complete("Hi".to_string())]);
        handshake(&mut bridge, now);

        bridge.channel.push_read(b"MSG:HELLO\r");
        bridge.poll_once(now).expect("message poll should succeed");
        assert_eq!(bridge.session().conversation().len(), 3);

        handshake(&mut bridge, now);
        assert_eq!(bridge.session().conversation().len(), 1);
    }
}
