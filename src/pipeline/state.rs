use std::fmt;

/// Where a pipeline is in its load → index → query → answer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Loaded,
    Indexed,
    Queried,
    Answered,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loaded => "loaded",
            PipelineState::Indexed => "indexed",
            PipelineState::Queried => "queried",
            PipelineState::Answered => "answered",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress updates during indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexProgress {
    /// Sentences of a page were split and chunked
    ChunkingPage { current: usize, total: usize },
    /// Chunks embedded and written so far
    StoringChunks { current: usize, total: usize },
}
