//! Wizard accumulator — threads the growing `ProfileDraft` through the
//! profile screens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::forms::validate::{self, ValidationError};
use crate::navigation::Route;

use super::model::{BodyMetrics, CompleteProfile, Goal, ProfileDraft, Restrictions};

/// The screens of the profile wizard.
///
/// Progresses linearly: Body → Cuisine → Restrictions → Goal → Ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Body,
    Cuisine,
    Restrictions,
    Goal,
    Ready,
}

impl WizardStep {
    /// Check if a forward transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Body, Cuisine) | (Cuisine, Restrictions) | (Restrictions, Goal) | (Goal, Ready)
        )
    }

    /// Whether the draft is complete at this step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Body => Some(Cuisine),
            Cuisine => Some(Restrictions),
            Restrictions => Some(Goal),
            Goal => Some(Ready),
            Ready => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Body => None,
            Cuisine => Some(Body),
            Restrictions => Some(Cuisine),
            Goal => Some(Restrictions),
            Ready => Some(Goal),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Body => "body",
            Self::Cuisine => "cuisine",
            Self::Restrictions => "restrictions",
            Self::Goal => "goal",
            Self::Ready => "ready",
        };
        write!(f, "{s}")
    }
}

/// Route parameter keys.
pub mod param_keys {
    pub const EMAIL: &str = "email";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const WEIGHT: &str = "weight";
    pub const HEIGHT: &str = "height";
    pub const ACTIVITY_LEVEL: &str = "activityLevel";
    pub const CUISINE: &str = "cuisine";
    pub const RESTRICTIONS: &str = "restrictions";
    pub const GOAL: &str = "goal";
}

/// String-only parameter bag carried by a navigation push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten a draft into parameters. Unset fields are omitted and the
    /// restriction set travels as a JSON array.
    pub fn from_draft(draft: &ProfileDraft) -> Self {
        use param_keys::*;

        let mut params = Self::new();
        params.insert(EMAIL, draft.email());
        if let Some(gender) = draft.gender() {
            params.insert(GENDER, gender.as_str());
        }
        if let Some(age) = draft.age() {
            params.insert(AGE, age.to_string());
        }
        if let Some(weight) = draft.weight_kg() {
            params.insert(WEIGHT, weight.to_string());
        }
        if let Some(height) = draft.height_cm() {
            params.insert(HEIGHT, height.to_string());
        }
        if let Some(activity) = draft.activity() {
            params.insert(ACTIVITY_LEVEL, activity.as_str());
        }
        if let Some(cuisine) = draft.cuisine() {
            params.insert(CUISINE, cuisine);
        }
        if let Some(restrictions) = draft.restrictions() {
            params.insert(RESTRICTIONS, restrictions.encode());
        }
        if let Some(goal) = draft.goal() {
            params.insert(GOAL, goal.as_str());
        }
        params
    }

    /// Rebuild a draft on arrival. Every present value goes back through its
    /// validator, so a tampered or malformed parameter is an error rather
    /// than a silent default. Body metrics travel as a group: either all five
    /// are present or none.
    pub fn to_draft(&self) -> Result<ProfileDraft, WizardError> {
        use param_keys::*;

        let email = self
            .get(EMAIL)
            .ok_or_else(|| route_error(EMAIL, "missing"))?;
        let email = validate::email(email).map_err(|e| invalid(EMAIL, e))?;
        let mut draft = ProfileDraft::new(email);

        if let Some(body) = self.body()? {
            draft = draft.with_body(body);
        }
        if let Some(raw) = self.get(CUISINE) {
            let cuisine = validate::cuisine(raw).map_err(|e| invalid(CUISINE, e))?;
            draft = draft.with_cuisine(cuisine);
        }
        if let Some(raw) = self.get(RESTRICTIONS) {
            let restrictions = Restrictions::decode(raw)
                .map_err(|e| route_error(RESTRICTIONS, e.to_string()))?;
            draft = draft.with_restrictions(restrictions);
        }
        if let Some(raw) = self.get(GOAL) {
            draft = draft.with_goal(validate::goal(raw).map_err(|e| invalid(GOAL, e))?);
        }
        Ok(draft)
    }

    fn body(&self) -> Result<Option<BodyMetrics>, WizardError> {
        use param_keys::*;

        const BODY_KEYS: [&str; 5] = [GENDER, AGE, WEIGHT, HEIGHT, ACTIVITY_LEVEL];
        if BODY_KEYS.iter().all(|key| self.get(key).is_none()) {
            return Ok(None);
        }
        let field = |key: &str| self.get(key).ok_or_else(|| route_error(key, "missing"));

        Ok(Some(BodyMetrics {
            gender: validate::gender(field(GENDER)?).map_err(|e| invalid(GENDER, e))?,
            age: validate::age(field(AGE)?).map_err(|e| invalid(AGE, e))?,
            weight_kg: validate::weight_kg(field(WEIGHT)?).map_err(|e| invalid(WEIGHT, e))?,
            height_cm: validate::height_cm(field(HEIGHT)?).map_err(|e| invalid(HEIGHT, e))?,
            activity: validate::activity(field(ACTIVITY_LEVEL)?)
                .map_err(|e| invalid(ACTIVITY_LEVEL, e))?,
        }))
    }
}

fn route_error(key: &str, reason: impl Into<String>) -> WizardError {
    WizardError::RouteParam {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn invalid(key: &str, err: ValidationError) -> WizardError {
    route_error(key, err.message)
}

/// Accumulates step outputs into a `ProfileDraft`.
///
/// Each `apply_*` is accepted only at its own step; the merged draft is
/// then carried forward. `email` is fixed at construction.
#[derive(Debug, Clone)]
pub struct ProfileWizard {
    step: WizardStep,
    draft: ProfileDraft,
}

impl ProfileWizard {
    /// Start a wizard for an account email.
    pub fn new(email: &str) -> Result<Self, ValidationError> {
        let email = validate::email(email)?;
        Ok(Self {
            step: WizardStep::Body,
            draft: ProfileDraft::new(email),
        })
    }

    /// Resume on arrival at `step` with upstream parameters.
    pub fn from_route(step: WizardStep, params: &RouteParams) -> Result<Self, WizardError> {
        let draft = params.to_draft()?;
        Ok(Self { step, draft })
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn email(&self) -> &str {
        self.draft.email()
    }

    /// Route for the current step carrying the accumulated draft.
    pub fn route(&self) -> Route {
        Route::Wizard {
            step: self.step,
            params: RouteParams::from_draft(&self.draft),
        }
    }

    pub fn apply_body(&mut self, body: BodyMetrics) -> Result<WizardStep, WizardError> {
        self.merge(WizardStep::Body, |d| d.with_body(body))
    }

    pub fn apply_cuisine(&mut self, cuisine: impl Into<String>) -> Result<WizardStep, WizardError> {
        let cuisine = cuisine.into();
        self.merge(WizardStep::Cuisine, |d| d.with_cuisine(cuisine))
    }

    pub fn apply_restrictions(
        &mut self,
        restrictions: Restrictions,
    ) -> Result<WizardStep, WizardError> {
        self.merge(WizardStep::Restrictions, |d| d.with_restrictions(restrictions))
    }

    pub fn apply_goal(&mut self, goal: Goal) -> Result<WizardStep, WizardError> {
        self.merge(WizardStep::Goal, |d| d.with_goal(goal))
    }

    fn merge<F>(&mut self, at: WizardStep, apply: F) -> Result<WizardStep, WizardError>
    where
        F: FnOnce(ProfileDraft) -> ProfileDraft,
    {
        let next = at.next().filter(|n| at.can_transition_to(*n));
        let next = match next {
            Some(next) if self.step == at => next,
            _ => {
                return Err(WizardError::OutOfOrder {
                    step: at.to_string(),
                    current: self.step.to_string(),
                });
            }
        };

        self.draft = apply(self.draft.clone());
        self.step = next;
        tracing::debug!(email = %self.draft.email(), step = %next, "Wizard advanced");
        Ok(next)
    }

    /// Go back one screen. Values already entered stay in the draft for
    /// pre-fill.
    pub fn back(&mut self) -> Option<WizardStep> {
        let previous = self.step.previous()?;
        self.step = previous;
        Some(previous)
    }

    /// Freeze the draft for submission. Only valid once every step is done.
    pub fn finish(self) -> Result<CompleteProfile, WizardError> {
        if !self.step.is_terminal() {
            return Err(WizardError::OutOfOrder {
                step: WizardStep::Ready.to_string(),
                current: self.step.to_string(),
            });
        }
        self.draft.complete()
    }
}
