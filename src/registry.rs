//! Semantic tag registry: maps domain objects to and from tagged values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::value::Value;

/// Encode hook: returns the tag content when the value is one it handles.
pub type EncodeFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Decode hook: rebuilds a domain value from decoded tag content.
pub type DecodeFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Tag encoders and decoders owned by a single codec.
///
/// Encoders are tried in registration order and the first match wins, so
/// register specific matchers before general ones. Decoders are keyed by tag
/// and a later registration replaces an earlier one.
#[derive(Clone, Default)]
pub struct Registry {
    encoders: Vec<(u64, EncodeFn)>,
    decoders: HashMap<u64, DecodeFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_semantic_encode<F>(&mut self, tag: u64, encode: F) -> &mut Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        debug!(tag, position = self.encoders.len(), "registered semantic encoder");
        self.encoders.push((tag, Arc::new(encode)));
        self
    }

    pub fn add_semantic_decode<F>(&mut self, tag: u64, decode: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        let replaced = self.decoders.insert(tag, Arc::new(decode)).is_some();
        debug!(tag, replaced, "registered semantic decoder");
        self
    }

    /// First encoder accepting `value`, with its tag and the content to wrap.
    pub fn find_encoder(&self, value: &Value) -> Option<(u64, Value)> {
        self.encoders
            .iter()
            .find_map(|(tag, encode)| encode(value).map(|content| (*tag, content)))
    }

    pub fn decoder(&self, tag: u64) -> Option<&DecodeFn> {
        self.decoders.get(&tag)
    }

    pub fn encoder_count(&self) -> usize {
        self.encoders.len()
    }

    pub fn decoder_count(&self) -> usize {
        self.decoders.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decoder_tags: Vec<_> = self.decoders.keys().copied().collect();
        decoder_tags.sort_unstable();
        f.debug_struct("Registry")
            .field(
                "encoders",
                &self.encoders.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
            )
            .field("decoders", &decoder_tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registered_encoder_wins() {
        let mut registry = Registry::new();
        registry
            .add_semantic_encode(100, |v| v.as_str().map(|s| Value::from(s.len())))
            .add_semantic_encode(200, |v| Some(v.clone()));

        assert_eq!(
            registry.find_encoder(&Value::from("abc")),
            Some((100, Value::from(3)))
        );
        // the catch-all only sees what the specific matcher declined
        assert_eq!(
            registry.find_encoder(&Value::from(5)),
            Some((200, Value::from(5)))
        );
    }

    #[test]
    fn test_no_encoder_matches() {
        let mut registry = Registry::new();
        registry.add_semantic_encode(1, |_| None);
        assert!(registry.find_encoder(&Value::Null).is_none());
    }

    #[test]
    fn test_last_decoder_wins() {
        let mut registry = Registry::new();
        registry
            .add_semantic_decode(7, |_| Ok(Value::from("first")))
            .add_semantic_decode(7, |_| Ok(Value::from("second")));

        assert_eq!(registry.decoder_count(), 1);
        let decode = registry.decoder(7).unwrap();
        assert_eq!(decode(Value::Null).unwrap(), Value::from("second"));
        assert!(registry.decoder(8).is_none());
    }

    #[test]
    fn test_clones_are_independent() {
        let mut base = Registry::new();
        base.add_semantic_decode(1, |v| Ok(v));
        let mut other = base.clone();
        other.add_semantic_decode(2, |v| Ok(v));

        assert_eq!(base.decoder_count(), 1);
        assert_eq!(other.decoder_count(), 2);
        assert_eq!(format!("{:?}", other), "Registry { encoders: [], decoders: [1, 2] }");
    }
}
