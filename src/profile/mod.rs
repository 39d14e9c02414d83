//! Profile onboarding — draft model, wizard screens, accumulator and
//! submission.

pub mod model;
pub mod steps;
pub mod submission;
pub mod wizard;

pub use model::{
    ActivityLevel, BodyMetrics, CompleteProfile, Gender, Goal, ProfileDraft, Restrictions,
};
pub use steps::{BodyStep, CuisineStep, GoalStep, RestrictionsStep};
pub use submission::{SubmissionOrchestrator, SubmissionPhase, SubmissionReport, SubmissionUpdate};
pub use wizard::{ProfileWizard, RouteParams, WizardStep};
