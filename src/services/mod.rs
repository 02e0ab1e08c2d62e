pub mod highlighter;
pub mod merger;
pub mod normalizer;
pub mod parser;
pub mod summary;

pub use highlighter::{escape_html, highlight_flagged_spans};
pub use merger::OverrideMerger;
pub use normalizer::normalize_criterion_keys;
pub use parser::{ParsedBatch, SubmissionParser};
pub use summary::{summarize_by_essay_type, EssayTypeSummary};
