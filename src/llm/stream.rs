use super::{Citation, StreamChunk};

/// Lifecycle of one in-flight streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Streaming,
    Settled,
    Failed,
}

/// Folds a sequence of response chunks into display state: the visible
/// markdown buffer, the transient thinking trace, and the deduplicated
/// citation list. One accumulator per request; the consumer republishes a
/// snapshot to the UI after every chunk that changed something.
#[derive(Debug)]
pub struct StreamAccumulator {
    phase: StreamPhase,
    text: String,
    thinking: String,
    citations: Vec<Citation>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            phase: StreamPhase::Idle,
            text: String::new(),
            thinking: String::new(),
            citations: Vec::new(),
        }
    }

    /// Enter the streaming phase with both buffers reset.
    pub fn begin(&mut self) {
        self.phase = StreamPhase::Streaming;
        self.text.clear();
        self.thinking.clear();
        self.citations.clear();
    }

    /// Fold one chunk in. Returns whether anything visible changed, so the
    /// caller emits at most one UI update per chunk.
    pub fn apply(&mut self, chunk: &StreamChunk) -> bool {
        let mut changed = false;
        if let Some(thought) = &chunk.thought {
            self.thinking.push_str(thought);
            changed = true;
        }
        if let Some(text) = &chunk.text {
            self.text.push_str(text);
            changed = true;
        }
        for citation in &chunk.citations {
            // Dedup by URI, first write wins: a URI seen again keeps the
            // title it arrived with first.
            if !self.citations.iter().any(|c| c.uri == citation.uri) {
                self.citations.push(citation.clone());
                changed = true;
            }
        }
        changed
    }

    /// Normal end of the chunk sequence. The thinking buffer is scratch
    /// state, not part of the result, and is dropped here.
    pub fn settle(&mut self) -> String {
        self.phase = StreamPhase::Settled;
        self.thinking.clear();
        self.text.clone()
    }

    /// Error while consuming the sequence. Accumulated text is kept; the
    /// UI decides whether to keep showing it.
    pub fn fail(&mut self) {
        self.phase = StreamPhase::Failed;
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_chunk(text: &str) -> StreamChunk {
        StreamChunk {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    fn cited_chunk(uri: &str, title: &str) -> StreamChunk {
        StreamChunk {
            citations: vec![Citation {
                uri: uri.into(),
                title: title.into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn settled_text_is_ordered_concatenation_of_deltas() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        for delta in ["# Title", "\n\nBody ", "text."] {
            acc.apply(&text_chunk(delta));
        }
        assert_eq!(acc.settle(), "# Title\n\nBody text.");
        assert_eq!(acc.phase(), StreamPhase::Settled);
    }

    #[test]
    fn thinking_buffer_is_empty_after_settlement() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        acc.apply(&StreamChunk {
            thought: Some("considering sources".into()),
            ..Default::default()
        });
        assert_eq!(acc.thinking(), "considering sources");
        acc.settle();
        assert!(acc.thinking().is_empty());
    }

    #[test]
    fn both_deltas_in_one_chunk_report_one_update() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        let changed = acc.apply(&StreamChunk {
            text: Some("answer".into()),
            thought: Some("reasoning".into()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(acc.text(), "answer");
        assert_eq!(acc.thinking(), "reasoning");
    }

    #[test]
    fn empty_chunk_reports_no_update() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        assert!(!acc.apply(&StreamChunk::default()));
    }

    #[test]
    fn citations_dedup_by_uri_first_write_wins() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        acc.apply(&cited_chunk("https://example.com/x", "First title"));
        acc.apply(&cited_chunk("https://example.com/x", "Second title"));
        acc.apply(&cited_chunk("https://example.com/y", "Other"));

        assert_eq!(acc.citations().len(), 2);
        assert_eq!(acc.citations()[0].title, "First title");
        assert_eq!(acc.citations()[1].uri, "https://example.com/y");
    }

    #[test]
    fn repeated_citation_reports_no_update() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        assert!(acc.apply(&cited_chunk("https://example.com/x", "Title")));
        assert!(!acc.apply(&cited_chunk("https://example.com/x", "Title")));
    }

    #[test]
    fn failure_keeps_partial_text() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        acc.apply(&text_chunk("partial "));
        acc.apply(&text_chunk("report"));
        acc.fail();
        assert_eq!(acc.phase(), StreamPhase::Failed);
        assert_eq!(acc.text(), "partial report");
    }

    #[test]
    fn begin_resets_previous_run() {
        let mut acc = StreamAccumulator::new();
        acc.begin();
        acc.apply(&text_chunk("old"));
        acc.apply(&cited_chunk("https://example.com/x", "Old"));
        acc.settle();

        acc.begin();
        assert_eq!(acc.phase(), StreamPhase::Streaming);
        assert!(acc.text().is_empty());
        assert!(acc.citations().is_empty());
    }
}
