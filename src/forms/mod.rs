//! Form input handling shared by every screen: field validators and
//! per-step form state.

pub mod step;
pub mod validate;

pub use step::{Rule, StepForm, StepRejection};
pub use validate::{ValidationError, Validated};
