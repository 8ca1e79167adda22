//! Transport encoding and hand-off of PCM chunks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Consumer of base64-encoded PCM16 chunks.
///
/// Called on the driver's thread; it must return promptly.
pub type ChunkCallback = Box<dyn FnMut(String)>;

/// Encode PCM bytes for a text transport.
pub fn encode_transport(pcm: &[u8]) -> String {
    STANDARD.encode(pcm)
}

/// Number of leading chunks logged individually.
const LOGGED_CHUNKS: u64 = 5;

/// Holds the single registered consumer and counts what it received.
#[derive(Default)]
pub struct ChunkEmitter {
    callback: Option<ChunkCallback>,
    emitted: u64,
}

impl ChunkEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the consumer, replacing any previous one.
    pub fn set_callback(&mut self, callback: ChunkCallback) {
        self.callback = Some(callback);
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Base64-encode `pcm` and invoke the consumer exactly once.
    pub fn emit(&mut self, pcm: &[u8]) {
        let text = encode_transport(pcm);
        self.emitted += 1;

        if self.emitted <= LOGGED_CHUNKS {
            log::debug!(
                "emitter: chunk #{} ({} bytes, base64 len {})",
                self.emitted,
                pcm.len(),
                text.len()
            );
        }

        match self.callback.as_mut() {
            Some(cb) => cb(text),
            None => log::trace!("emitter: no consumer registered, chunk dropped"),
        }
    }

    /// Chunks emitted since the counter was last reset.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn reset_count(&mut self) {
        self.emitted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn encodes_standard_base64() {
        assert_eq!(encode_transport(&[0x00, 0x40, 0xFF, 0x7F]), "AED/fw==");
        assert_eq!(encode_transport(&[]), "");
    }

    #[test]
    fn emit_invokes_callback_once_per_chunk() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut emitter = ChunkEmitter::new();
        emitter.set_callback(Box::new(move |s| sink.borrow_mut().push(s)));
        emitter.emit(&[1, 2]);
        emitter.emit(&[3, 4]);

        assert_eq!(*seen.borrow(), vec!["AQI=".to_string(), "AwQ=".to_string()]);
        assert_eq!(emitter.emitted(), 2);
    }

    #[test]
    fn emit_without_callback_still_counts() {
        let mut emitter = ChunkEmitter::new();
        assert!(!emitter.has_callback());
        emitter.emit(&[0, 0]);
        assert_eq!(emitter.emitted(), 1);
        emitter.reset_count();
        assert_eq!(emitter.emitted(), 0);
    }
}
