pub mod criterion;
pub mod loaders;
pub mod raw;
pub mod review;
pub mod score;
pub mod submission;
pub mod uploaded;

pub use criterion::{Criterion, KeyForm, RubricLevel};
pub use loaders::{load_all_overrides, load_grading_response, load_override, load_uploaded_essays};
pub use raw::{GradingFailure, RawGradingResponse, RawRecord};
pub use review::{ReviewerOverride, TouchedCriteria};
pub use score::{Provenance, ScoreMode, ScoreRecord};
pub use submission::{ProcessingStatus, Submission};
pub use uploaded::{EssaySource, NoEssaySource, UploadedEssay, UploadedEssays};
