pub mod review_session;
pub mod review_view;

pub use review_session::{ReviewSession, TouchTracker};
pub use review_view::{CriterionRow, SubmissionView};
