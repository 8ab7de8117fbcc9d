//! Incremental scanner over the model's streamed JSON so the chat
//! handler can emit `language`/`intent`/`content` SSE frames as soon as
//! each field closes, without waiting for the whole document.
//!
//! This is a purpose-built character scanner, not a general JSON
//! parser: it only tracks enough structure (string boundaries, escape
//! sequences, and the key immediately preceding a value) to recognize
//! the three field names the streaming protocol cares about. Nothing
//! here is authoritative — once the stream ends, the caller re-parses
//! the full buffered text with `serde_json::from_str::<StructuredResponse>`
//! and uses that for every decision past the SSE frames themselves.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Language(String),
    Intent(String),
    ContentDelta(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Language,
    Intent,
    FinalAnswer,
}

#[derive(Default)]
pub struct FrameExtractor {
    full: String,

    in_string: bool,
    escaped: bool,
    token: String,

    last_closed_string: Option<String>,
    pending_target: Option<Target>,
    active_target: Option<Target>,
    value_buf: String,

    language_emitted: bool,
    intent_emitted: bool,
    final_answer_started: bool,
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_text(&self) -> &str {
        &self.full
    }

    /// Feeds one chunk of raw model output and returns the events it
    /// produced. Safe to call repeatedly as chunks arrive; state
    /// persists across calls so a field split across two chunks is
    /// still recognized correctly.
    pub fn feed(&mut self, chunk: &str) -> Vec<FrameEvent> {
        self.full.push_str(chunk);

        let mut events = Vec::new();
        let mut content_delta = String::new();

        for c in chunk.chars() {
            if self.in_string {
                self.feed_string_char(c, &mut events, &mut content_delta);
            } else {
                self.feed_structural_char(c);
            }
        }

        if !content_delta.is_empty() {
            events.push(FrameEvent::ContentDelta(content_delta));
        }

        events
    }

    fn feed_string_char(&mut self, c: char, events: &mut Vec<FrameEvent>, content_delta: &mut String) {
        if self.escaped {
            let actual = match c {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '"' => '"',
                '\\' => '\\',
                '/' => '/',
                other => other,
            };
            self.token.push(actual);
            if self.active_target.is_some() {
                self.value_buf.push(actual);
                if self.active_target == Some(Target::FinalAnswer) {
                    content_delta.push(actual);
                }
            }
            self.escaped = false;
            return;
        }

        if c == '\\' {
            self.escaped = true;
            return;
        }

        if c == '"' {
            self.in_string = false;
            let completed = std::mem::take(&mut self.token);

            if let Some(target) = self.active_target.take() {
                let value = std::mem::take(&mut self.value_buf);
                match target {
                    Target::Language if !self.language_emitted => {
                        self.language_emitted = true;
                        events.push(FrameEvent::Language(value));
                    }
                    Target::Intent if !self.intent_emitted => {
                        self.intent_emitted = true;
                        events.push(FrameEvent::Intent(value));
                    }
                    _ => {}
                }
                self.last_closed_string = None;
            } else {
                self.last_closed_string = Some(completed);
            }
            return;
        }

        self.token.push(c);
        if self.active_target.is_some() {
            self.value_buf.push(c);
            if self.active_target == Some(Target::FinalAnswer) {
                content_delta.push(c);
            }
        }
    }

    fn feed_structural_char(&mut self, c: char) {
        match c {
            '"' => {
                self.in_string = true;
                self.token.clear();
                if let Some(target) = self.pending_target.take() {
                    self.active_target = Some(target);
                    self.value_buf.clear();
                }
            }
            ':' => {
                if let Some(key) = self.last_closed_string.take() {
                    self.pending_target = self.target_for_key(&key);
                }
            }
            ',' | '{' | '}' | '[' | ']' => {
                self.last_closed_string = None;
                self.pending_target = None;
            }
            _ => {}
        }
    }

    fn target_for_key(&mut self, key: &str) -> Option<Target> {
        match key {
            "language" if !self.language_emitted => Some(Target::Language),
            "intent" if !self.intent_emitted => Some(Target::Intent),
            "final_answer" if !self.final_answer_started => {
                self.final_answer_started = true;
                Some(Target::FinalAnswer)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_language_and_intent_once_each() {
        let mut ext = FrameExtractor::new();
        let events = ext.feed(r#"{"thinking":{"intent":"GENERAL_CHAT","language":"en"},"intent":"GENERAL_CHAT","#);
        assert_eq!(events[0], FrameEvent::Intent("GENERAL_CHAT".to_string()));
        assert_eq!(events[1], FrameEvent::Language("en".to_string()));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn streams_final_answer_across_chunk_boundaries() {
        let mut ext = FrameExtractor::new();
        ext.feed(r#"{"intent":"GENERAL_CHAT","language":"en","final_answer":"Hel"#);
        let events = ext.feed(r#"lo there","#);
        assert_eq!(
            events,
            vec![FrameEvent::ContentDelta("lo there".to_string())]
        );
        assert_eq!(
            ext.full_text(),
            r#"{"intent":"GENERAL_CHAT","language":"en","final_answer":"Hello there","#
        );
    }

    #[test]
    fn handles_escaped_quotes_in_final_answer() {
        let mut ext = FrameExtractor::new();
        let events = ext.feed(r#"{"final_answer":"say \"hi\""}"#);
        let deltas: String = events
            .into_iter()
            .filter_map(|e| match e {
                FrameEvent::ContentDelta(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, "say \"hi\"");
    }

    #[test]
    fn full_text_is_authoritative_for_final_parse() {
        let mut ext = FrameExtractor::new();
        let raw = r#"{"thinking":{"intent":"GENERAL_CHAT","language":"en"},"intent":"GENERAL_CHAT","language":"en","final_answer":"hi"}"#;
        ext.feed(raw);
        let parsed: switchboard_core::StructuredResponse =
            serde_json::from_str(ext.full_text()).unwrap();
        assert_eq!(parsed.intent, "GENERAL_CHAT");
        assert_eq!(parsed.final_answer, "hi");
    }
}
