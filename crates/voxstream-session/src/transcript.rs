use crate::render::TextRenderer;
use std::sync::Arc;
use voxstream_core::Hypothesis;

/// Holds the decoder's current best hypothesis and renders it on demand.
///
/// Each update replaces the previous hypothesis outright. The first update
/// after [`mark_flushed`](Self::mark_flushed) makes the transcript final.
pub struct TranscriptAccumulator {
    renderer: Arc<dyn TextRenderer>,
    hypothesis: Hypothesis,
    flush_pending: bool,
    is_final: bool,
}

impl TranscriptAccumulator {
    pub fn new(renderer: Arc<dyn TextRenderer>) -> Self {
        Self {
            renderer,
            hypothesis: Hypothesis::default(),
            flush_pending: false,
            is_final: false,
        }
    }

    pub fn update(&mut self, hypothesis: Hypothesis) {
        debug_assert!(!self.is_final, "update after transcript was finalized");
        self.hypothesis = hypothesis;
        if self.flush_pending {
            self.flush_pending = false;
            self.is_final = true;
        }
    }

    pub fn mark_flushed(&mut self) {
        self.flush_pending = true;
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn hypothesis(&self) -> &Hypothesis {
        &self.hypothesis
    }

    pub fn current_text(&self) -> String {
        self.renderer.render(&self.hypothesis.tokens)
    }

    /// Forget the current utterance.
    pub fn clear(&mut self) {
        self.hypothesis = Hypothesis::default();
        self.flush_pending = false;
        self.is_final = false;
    }
}
