//! Typed wizard screens.
//!
//! Each step wraps a `StepForm`, pre-fills from the upstream draft, and on
//! `submit` turns its raw text into the typed slice of the profile it owns.

use std::collections::BTreeSet;

use crate::forms::validate;
use crate::forms::{Rule, StepForm, StepRejection};

use super::model::{BodyMetrics, Goal, ProfileDraft, RESTRICTION_TAGS, Restrictions};

/// Gender, age, weight, height and activity level.
#[derive(Debug, Clone)]
pub struct BodyStep {
    form: StepForm,
}

impl BodyStep {
    pub const GENDER: &'static str = "gender";
    pub const AGE: &'static str = "age";
    pub const WEIGHT: &'static str = "weight";
    pub const HEIGHT: &'static str = "height";
    pub const ACTIVITY: &'static str = "activity";

    pub fn new() -> Self {
        Self {
            form: StepForm::new()
                .field(Self::GENDER, Rule::Gender)
                .field(Self::AGE, Rule::Age)
                .field(Self::WEIGHT, Rule::Weight)
                .field(Self::HEIGHT, Rule::Height)
                .field(Self::ACTIVITY, Rule::Activity),
        }
    }

    /// Pre-fill from values already in the draft (e.g. after going back).
    pub fn from_draft(draft: &ProfileDraft) -> Self {
        let mut step = Self::new();
        if let Some(gender) = draft.gender() {
            step.form.set(Self::GENDER, gender.as_str());
        }
        if let Some(age) = draft.age() {
            step.form.set(Self::AGE, &age.to_string());
        }
        if let Some(weight) = draft.weight_kg() {
            step.form.set(Self::WEIGHT, &weight.to_string());
        }
        if let Some(height) = draft.height_cm() {
            step.form.set(Self::HEIGHT, &height.to_string());
        }
        if let Some(activity) = draft.activity() {
            step.form.set(Self::ACTIVITY, activity.as_str());
        }
        step
    }

    pub fn form(&self) -> &StepForm {
        &self.form
    }

    pub fn set(&mut self, field: &str, value: &str) -> bool {
        self.form.set(field, value)
    }

    pub fn submit(&mut self) -> Result<BodyMetrics, StepRejection> {
        self.form.submit()?;
        let f = &self.form;
        Ok(BodyMetrics {
            gender: validate::gender(f.value(Self::GENDER))
                .map_err(|e| StepRejection::field(Self::GENDER, e))?,
            age: validate::age(f.value(Self::AGE)).map_err(|e| StepRejection::field(Self::AGE, e))?,
            weight_kg: validate::weight_kg(f.value(Self::WEIGHT))
                .map_err(|e| StepRejection::field(Self::WEIGHT, e))?,
            height_cm: validate::height_cm(f.value(Self::HEIGHT))
                .map_err(|e| StepRejection::field(Self::HEIGHT, e))?,
            activity: validate::activity(f.value(Self::ACTIVITY))
                .map_err(|e| StepRejection::field(Self::ACTIVITY, e))?,
        })
    }
}

impl Default for BodyStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Single cuisine selection.
#[derive(Debug, Clone)]
pub struct CuisineStep {
    form: StepForm,
}

impl CuisineStep {
    pub const CUISINE: &'static str = "cuisine";

    pub fn new() -> Self {
        Self {
            form: StepForm::new().field(Self::CUISINE, Rule::Cuisine),
        }
    }

    pub fn from_draft(draft: &ProfileDraft) -> Self {
        let mut step = Self::new();
        if let Some(cuisine) = draft.cuisine() {
            step.form.set(Self::CUISINE, cuisine);
        }
        step
    }

    pub fn form(&self) -> &StepForm {
        &self.form
    }

    pub fn select(&mut self, cuisine: &str) {
        self.form.set(Self::CUISINE, cuisine);
    }

    pub fn submit(&mut self) -> Result<String, StepRejection> {
        self.form.submit()?;
        validate::cuisine(self.form.value(Self::CUISINE))
            .map(str::to_string)
            .map_err(|e| StepRejection::field(Self::CUISINE, e))
    }
}

impl Default for CuisineStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Tag toggles plus a free-text comma-separated entry.
#[derive(Debug, Clone)]
pub struct RestrictionsStep {
    selected: BTreeSet<&'static str>,
    form: StepForm,
}

impl RestrictionsStep {
    pub const CUSTOM: &'static str = "custom";

    pub fn new() -> Self {
        Self {
            selected: BTreeSet::new(),
            form: StepForm::new().field(Self::CUSTOM, Rule::CustomRestrictions),
        }
    }

    /// Known tags come back as toggles; anything else is shown as custom text.
    pub fn from_draft(draft: &ProfileDraft) -> Self {
        let mut step = Self::new();
        if let Some(restrictions) = draft.restrictions() {
            let mut custom = Vec::new();
            for entry in restrictions.iter() {
                match RESTRICTION_TAGS.iter().find(|tag| **tag == entry) {
                    Some(tag) => {
                        step.selected.insert(*tag);
                    }
                    None => custom.push(entry),
                }
            }
            step.form.set(Self::CUSTOM, &custom.join(", "));
        }
        step
    }

    pub fn form(&self) -> &StepForm {
        &self.form
    }

    /// Flip a predefined tag. Returns the new selection state, or `None`
    /// if the tag is not one of the offered ones.
    pub fn toggle(&mut self, tag: &str) -> Option<bool> {
        let tag = *RESTRICTION_TAGS.iter().find(|t| **t == tag)?;
        if self.selected.remove(tag) {
            Some(false)
        } else {
            self.selected.insert(tag);
            Some(true)
        }
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.contains(tag)
    }

    pub fn set_custom(&mut self, text: &str) {
        self.form.set(Self::CUSTOM, text);
    }

    pub fn submit(&mut self) -> Result<Restrictions, StepRejection> {
        self.form.submit()?;
        let custom = validate::custom_restrictions(self.form.value(Self::CUSTOM))
            .map_err(|e| StepRejection::field(Self::CUSTOM, e))?;
        Ok(Restrictions::from_parts(self.selected.iter(), custom))
    }
}

impl Default for RestrictionsStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Fat loss or muscle gain. Completing this step triggers submission.
#[derive(Debug, Clone)]
pub struct GoalStep {
    form: StepForm,
}

impl GoalStep {
    pub const GOAL: &'static str = "goal";

    pub fn new() -> Self {
        Self {
            form: StepForm::new().field(Self::GOAL, Rule::Goal),
        }
    }

    pub fn from_draft(draft: &ProfileDraft) -> Self {
        let mut step = Self::new();
        if let Some(goal) = draft.goal() {
            step.form.set(Self::GOAL, goal.as_str());
        }
        step
    }

    pub fn form(&self) -> &StepForm {
        &self.form
    }

    pub fn select(&mut self, goal: &str) {
        self.form.set(Self::GOAL, goal);
    }

    pub fn submit(&mut self) -> Result<Goal, StepRejection> {
        self.form.submit()?;
        validate::goal(self.form.value(Self::GOAL)).map_err(|e| StepRejection::field(Self::GOAL, e))
    }
}

impl Default for GoalStep {
    fn default() -> Self {
        Self::new()
    }
}
