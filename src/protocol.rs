//! JSON messages exchanged with the speech-to-text server.
//!
//! | Direction | Shape | Meaning |
//! |-----------|-------|---------|
//! | client → server | `{"audio":"<base64>"}` | one PCM16 chunk, 16 kHz mono |
//! | client → server | `{"eventType":"stop"}` | end of utterance; transcribe |
//! | server → client | `{"text":"..."}` | final transcript |
//! | server → client | `{"error":"..."}` | server-side failure |
//!
//! The streamer only produces [`ClientMessage`]s.  [`ServerMessage::parse`]
//! is for consumers of this crate that read the server's replies off the
//! same connection.

use serde::{Deserialize, Serialize};

/// Control events sent in the `eventType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Stop,
}

/// Messages sent by the streaming client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// One base64 PCM16 chunk.
    Audio { audio: String },
    /// A control event such as the end-of-stream marker.
    Event {
        #[serde(rename = "eventType")]
        event_type: EventType,
    },
}

impl ClientMessage {
    pub fn audio(chunk: impl Into<String>) -> Self {
        ClientMessage::Audio {
            audio: chunk.into(),
        }
    }

    /// The end-of-stream marker.
    pub fn stop() -> Self {
        ClientMessage::Event {
            event_type: EventType::Stop,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Messages received from the STT server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Transcript { text: String },
    Error { error: String },
}

#[derive(Deserialize)]
struct RawServerMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ServerMessage {
    /// Parse a server frame.
    ///
    /// A non-empty `text` wins over `error`.  Frames that are not JSON or
    /// carry neither field with content yield `None`.
    pub fn parse(frame: &str) -> Option<Self> {
        let raw: RawServerMessage = serde_json::from_str(frame).ok()?;
        match (raw.text, raw.error) {
            (Some(text), _) if !text.is_empty() => Some(ServerMessage::Transcript { text }),
            (_, Some(error)) if !error.is_empty() => Some(ServerMessage::Error { error }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_message_shape() {
        let json = ClientMessage::audio("AAEC").to_json().unwrap();
        assert_eq!(json, r#"{"audio":"AAEC"}"#);
    }

    #[test]
    fn stop_message_shape() {
        let json = ClientMessage::stop().to_json().unwrap();
        assert_eq!(json, r#"{"eventType":"stop"}"#);
    }

    #[test]
    fn client_messages_deserialize() {
        let audio: ClientMessage = serde_json::from_str(r#"{"audio":"QQ=="}"#).unwrap();
        assert_eq!(audio, ClientMessage::audio("QQ=="));

        let stop: ClientMessage = serde_json::from_str(r#"{"eventType":"stop"}"#).unwrap();
        assert_eq!(stop, ClientMessage::stop());
    }

    #[test]
    fn parse_transcript() {
        assert_eq!(
            ServerMessage::parse(r#"{"text":"hello world"}"#),
            Some(ServerMessage::Transcript {
                text: "hello world".into()
            })
        );
    }

    #[test]
    fn parse_error() {
        assert_eq!(
            ServerMessage::parse(r#"{"error":"No audio received"}"#),
            Some(ServerMessage::Error {
                error: "No audio received".into()
            })
        );
    }

    #[test]
    fn empty_or_unknown_frames_are_ignored() {
        assert_eq!(ServerMessage::parse(r#"{"text":""}"#), None);
        assert_eq!(ServerMessage::parse(r#"{"status":"ok"}"#), None);
        assert_eq!(ServerMessage::parse("not json"), None);
    }

    #[test]
    fn empty_text_falls_back_to_error() {
        assert_eq!(
            ServerMessage::parse(r#"{"text":"","error":"boom"}"#),
            Some(ServerMessage::Error {
                error: "boom".into()
            })
        );
    }
}
