//! Password reset by emailed code, with a resend cooldown.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::time::Instant;
use tracing::info;

use crate::api::auth::{AuthApi, ResetPasswordRequest};
use crate::error::FlowError;
use crate::forms::{Rule, StepForm};
use crate::navigation::Route;
use crate::store::Storage;
use crate::store::keys;

/// Time before another code may be requested.
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(180);

/// Countdown gating "resend code".
#[derive(Debug, Clone)]
pub struct ResendTimer {
    cooldown: Duration,
    started: Option<Instant>,
}

impl ResendTimer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            started: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        match self.started {
            Some(started) => self.cooldown.saturating_sub(now.saturating_duration_since(started)),
            None => Duration::ZERO,
        }
    }

    pub fn can_resend(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// Remaining time as `m:ss`, whole seconds rounded up.
    pub fn label(&self, now: Instant) -> String {
        let remaining = self.remaining(now);
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

impl Default for ResendTimer {
    fn default() -> Self {
        Self::new(RESEND_COOLDOWN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    Email,
    Code,
    NewPassword,
    Done,
}

impl ResetStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Code => "code",
            Self::NewPassword => "new_password",
            Self::Done => "done",
        }
    }
}

pub struct PasswordResetFlow {
    api: Arc<dyn AuthApi>,
    storage: Storage,
    step: ResetStep,
    email: Option<String>,
    form: StepForm,
    timer: ResendTimer,
    otp_length: usize,
}

impl PasswordResetFlow {
    pub const EMAIL: &'static str = "email";
    pub const CODE: &'static str = "code";
    pub const PASSWORD: &'static str = "password";
    pub const CONFIRM: &'static str = "confirmPassword";

    pub fn new(api: Arc<dyn AuthApi>, storage: Storage, otp_length: usize) -> Self {
        Self {
            api,
            storage,
            step: ResetStep::Email,
            email: None,
            form: Self::form_for(ResetStep::Email, otp_length),
            timer: ResendTimer::default(),
            otp_length,
        }
    }

    /// Pick up an interrupted reset: with a saved email the flow starts at
    /// code entry (a resend is allowed right away), and with a saved code
    /// too it starts at the new password.
    pub async fn resume(api: Arc<dyn AuthApi>, storage: Storage, otp_length: usize) -> Self {
        let mut flow = Self::new(api, storage, otp_length);
        if let Some(email) = flow.storage.get(keys::RESET_EMAIL).await {
            flow.email = Some(email);
            let step = if flow.storage.get(keys::VERIFICATION_CODE).await.is_some() {
                ResetStep::NewPassword
            } else {
                ResetStep::Code
            };
            flow.advance(step);
        }
        flow
    }

    fn form_for(step: ResetStep, otp_length: usize) -> StepForm {
        match step {
            ResetStep::Email => StepForm::new().field(Self::EMAIL, Rule::Email),
            ResetStep::Code => StepForm::new().field(Self::CODE, Rule::Otp(otp_length)),
            ResetStep::NewPassword => StepForm::new()
                .field(Self::PASSWORD, Rule::NewPassword)
                .field(Self::CONFIRM, Rule::ConfirmOf(Self::PASSWORD)),
            ResetStep::Done => StepForm::new(),
        }
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn form(&self) -> &StepForm {
        &self.form
    }

    pub fn timer(&self) -> &ResendTimer {
        &self.timer
    }

    pub fn set(&mut self, field: &str, value: &str) -> bool {
        self.form.set(field, value)
    }

    fn advance(&mut self, step: ResetStep) {
        self.step = step;
        self.form = Self::form_for(step, self.otp_length);
    }

    pub async fn next(&mut self) -> Result<Route, FlowError> {
        match self.step {
            ResetStep::Email => self.submit_email().await,
            ResetStep::Code => self.submit_code().await,
            ResetStep::NewPassword => self.submit_password().await,
            ResetStep::Done => Err(FlowError::OutOfOrder {
                step: "next",
                current: self.step.as_str(),
            }),
        }
    }

    async fn submit_email(&mut self) -> Result<Route, FlowError> {
        self.form.submit()?;
        let email = self.form.value(Self::EMAIL).trim().to_string();

        let ack = self.api.send_verification_token(&email).await?;
        if !ack.success {
            return Err(FlowError::Rejected(
                ack.message_or("Failed to send verification code"),
            ));
        }

        self.storage.set(keys::RESET_EMAIL, &email).await;
        self.timer.start(Instant::now());
        info!(email = %email, "Reset code sent");

        self.email = Some(email.clone());
        self.advance(ResetStep::Code);
        Ok(Route::ResetVerify { email })
    }

    async fn submit_code(&mut self) -> Result<Route, FlowError> {
        self.form.submit()?;
        let email = self.current_email()?;
        let code = self.form.value(Self::CODE).to_string();

        let ack = self.api.verify_reset_code(&code).await?;
        if !ack.success {
            return Err(FlowError::Rejected(ack.message_or("Invalid verification code")));
        }

        self.storage.set(keys::VERIFICATION_CODE, &code).await;
        self.advance(ResetStep::NewPassword);
        Ok(Route::ResetNewPassword { email })
    }

    async fn submit_password(&mut self) -> Result<Route, FlowError> {
        self.form.submit()?;
        let email = self.current_email()?;

        let request = ResetPasswordRequest {
            email: email.clone(),
            password: SecretString::from(self.form.value(Self::PASSWORD).to_string()),
            confirm_password: SecretString::from(self.form.value(Self::CONFIRM).to_string()),
        };
        let ack = self.api.reset_password(&request).await?;
        if !ack.success {
            return Err(FlowError::Rejected(ack.message_or("Password reset failed")));
        }

        self.storage.remove(keys::RESET_EMAIL).await;
        self.storage.remove(keys::VERIFICATION_CODE).await;
        self.storage.set_has_seen_onboarding(true).await;
        info!(email = %email, "Password reset");

        self.advance(ResetStep::Done);
        Ok(Route::Login)
    }

    /// Request another code. Only allowed on the code screen once the
    /// countdown has run out; restarts the countdown.
    pub async fn resend(&mut self) -> Result<(), FlowError> {
        if self.step != ResetStep::Code {
            return Err(FlowError::OutOfOrder {
                step: "resend",
                current: self.step.as_str(),
            });
        }
        let now = Instant::now();
        if !self.timer.can_resend(now) {
            return Err(FlowError::Rejected(format!(
                "You can request a new code in {}",
                self.timer.label(now)
            )));
        }
        let email = self.current_email()?;

        let ack = self.api.send_verification_token(&email).await?;
        if !ack.success {
            return Err(FlowError::Rejected(
                ack.message_or("Failed to send verification code"),
            ));
        }
        self.timer.start(Instant::now());
        info!(email = %email, "Reset code resent");
        Ok(())
    }

    fn current_email(&self) -> Result<String, FlowError> {
        self.email.clone().ok_or(FlowError::OutOfOrder {
            step: self.step.as_str(),
            current: ResetStep::Email.as_str(),
        })
    }
}
