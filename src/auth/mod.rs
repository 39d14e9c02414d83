//! Authentication: session lifecycle, signup and password reset flows, and
//! user-facing classification of login failures.

pub mod alerts;
pub mod reset;
pub mod session;
pub mod signup;

pub use alerts::{AlertAction, LoginAlert};
pub use reset::{PasswordResetFlow, RESEND_COOLDOWN, ResendTimer, ResetStep};
pub use session::{NewAccount, SessionManager, SessionState};
pub use signup::{SignupFlow, SignupStep};
