//! Account creation: email check, account details, email verification.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;

use crate::api::auth::{AuthApi, DEFAULT_ROLE};
use crate::error::FlowError;
use crate::forms::{Rule, StepForm};
use crate::navigation::Route;
use crate::profile::wizard::ProfileWizard;

use super::session::{NewAccount, SessionManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep {
    Email,
    Details,
    Verify,
    Done,
}

impl SignupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Details => "details",
            Self::Verify => "verify",
            Self::Done => "done",
        }
    }
}

pub struct SignupFlow {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionManager>,
    step: SignupStep,
    email: Option<String>,
    form: StepForm,
    otp_length: usize,
}

impl SignupFlow {
    pub const EMAIL: &'static str = "email";
    pub const FIRSTNAME: &'static str = "firstname";
    pub const LASTNAME: &'static str = "lastname";
    pub const PASSWORD: &'static str = "password";
    pub const CONFIRM: &'static str = "confirmPassword";
    pub const CODE: &'static str = "code";

    pub fn new(api: Arc<dyn AuthApi>, session: Arc<SessionManager>, otp_length: usize) -> Self {
        Self {
            api,
            session,
            step: SignupStep::Email,
            email: None,
            form: Self::form_for(SignupStep::Email, otp_length),
            otp_length,
        }
    }

    fn form_for(step: SignupStep, otp_length: usize) -> StepForm {
        match step {
            SignupStep::Email => StepForm::new().field(Self::EMAIL, Rule::Email),
            SignupStep::Details => StepForm::new()
                .field(Self::FIRSTNAME, Rule::Required("First name"))
                .field(Self::LASTNAME, Rule::Required("Last name"))
                .field(Self::PASSWORD, Rule::NewPassword)
                .field(Self::CONFIRM, Rule::ConfirmOf(Self::PASSWORD)),
            SignupStep::Verify => StepForm::new().field(Self::CODE, Rule::Otp(otp_length)),
            SignupStep::Done => StepForm::new(),
        }
    }

    pub fn step(&self) -> SignupStep {
        self.step
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Form for the current screen.
    pub fn form(&self) -> &StepForm {
        &self.form
    }

    pub fn set(&mut self, field: &str, value: &str) -> bool {
        self.form.set(field, value)
    }

    fn advance(&mut self, step: SignupStep) {
        self.step = step;
        self.form = Self::form_for(step, self.otp_length);
    }

    /// Submit the current screen and move on.
    pub async fn next(&mut self) -> Result<Route, FlowError> {
        match self.step {
            SignupStep::Email => self.submit_email().await,
            SignupStep::Details => self.submit_details().await,
            SignupStep::Verify => self.submit_code().await,
            SignupStep::Done => Err(FlowError::OutOfOrder {
                step: "next",
                current: self.step.as_str(),
            }),
        }
    }

    async fn submit_email(&mut self) -> Result<Route, FlowError> {
        self.form.submit()?;
        let email = self.form.value(Self::EMAIL).trim().to_string();

        let check = self.api.check_email(&email).await?;
        if check.is_registered {
            info!(email = %email, "Signup blocked, email already registered");
            return Err(FlowError::AlreadyRegistered(email));
        }

        self.email = Some(email.clone());
        self.advance(SignupStep::Details);
        Ok(Route::SignupDetails { email })
    }

    async fn submit_details(&mut self) -> Result<Route, FlowError> {
        self.form.submit()?;
        let email = self.current_email()?;

        let account = NewAccount {
            email: email.clone(),
            password: SecretString::from(self.form.value(Self::PASSWORD).to_string()),
            firstname: self.form.value(Self::FIRSTNAME).trim().to_string(),
            lastname: self.form.value(Self::LASTNAME).trim().to_string(),
            role: DEFAULT_ROLE.to_string(),
        };
        self.session.signup(account).await?;

        self.advance(SignupStep::Verify);
        Ok(Route::VerifyEmail { email })
    }

    async fn submit_code(&mut self) -> Result<Route, FlowError> {
        self.form.submit()?;
        let email = self.current_email()?;
        let code = self.form.value(Self::CODE).to_string();

        let ack = self.api.verify_email(&code).await?;
        if !ack.success {
            return Err(FlowError::Rejected(ack.message_or("Verification failed")));
        }

        info!(email = %email, "Email verified");
        self.advance(SignupStep::Done);
        let wizard = ProfileWizard::new(&email).map_err(|e| FlowError::Rejected(e.message))?;
        Ok(wizard.route())
    }

    fn current_email(&self) -> Result<String, FlowError> {
        self.email.clone().ok_or(FlowError::OutOfOrder {
            step: "details",
            current: self.step.as_str(),
        })
    }
}
