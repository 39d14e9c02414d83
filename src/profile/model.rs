//! Profile data models: the draft built across the wizard and the complete,
//! submittable profile.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::forms::validate::{self, ValidationError};

/// Cuisines offered on the cuisine step.
pub const CUISINES: &[&str] = &[
    "Italian",
    "Indian",
    "Mexican",
    "Chinese",
    "Japanese",
    "Thai",
    "Mediterranean",
    "American",
];

/// Pre-enumerated ingredient tags offered on the restrictions step.
pub const RESTRICTION_TAGS: &[&str] = &[
    "Gluten", "Dairy", "Egg", "Soy", "Peanut", "Wheat", "Milk", "Fish",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const LABELS: &'static [&'static str] = &["Male", "Female"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Self-reported activity level; the backend only sees the factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
}

impl ActivityLevel {
    pub const LABELS: &'static [&'static str] = &["sedentary", "light", "moderate", "active"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "sedentary" => Some(Self::Sedentary),
            "light" => Some(Self::Light),
            "moderate" => Some(Self::Moderate),
            "active" => Some(Self::Active),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
        }
    }

    /// Multiplier applied to basal energy expenditure.
    pub fn factor(&self) -> f64 {
        match self {
            Self::Sedentary => 1.3,
            Self::Light => 1.5,
            Self::Moderate => 1.7,
            Self::Active => 1.9,
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "Fat Loss")]
    FatLoss,
    #[serde(rename = "Muscle Gain")]
    MuscleGain,
}

impl Goal {
    pub const LABELS: &'static [&'static str] = &["Fat Loss", "Muscle Gain"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Fat Loss" => Some(Self::FatLoss),
            "Muscle Gain" => Some(Self::MuscleGain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FatLoss => "Fat Loss",
            Self::MuscleGain => "Muscle Gain",
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ingredient restrictions: trimmed, non-empty, deduplicated entries,
/// case-sensitive as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restrictions(BTreeSet<String>);

impl Restrictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of selected tags and custom entries.
    pub fn from_parts<S, C>(selected: S, custom: C) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut out = Self::new();
        for entry in selected {
            out.insert(entry.as_ref());
        }
        for entry in custom {
            out.insert(entry.as_ref());
        }
        out
    }

    /// Insert after trimming. Empty entries are dropped; returns whether the
    /// entry was new.
    pub fn insert(&mut self, entry: &str) -> bool {
        let entry = entry.trim();
        if entry.is_empty() {
            return false;
        }
        self.0.insert(entry.to_string())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// String form used when the set crosses a screen boundary.
    pub fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Inverse of `encode`. Entries are re-normalized on the way in.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<String> = serde_json::from_str(raw)?;
        Ok(Self::from_parts(entries, std::iter::empty::<&str>()))
    }
}

/// Output of the body-metrics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    pub gender: Gender,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity: ActivityLevel,
}

/// The aggregate record being built across the wizard.
///
/// `email` is fixed at construction and has no setter; every other field is
/// filled by exactly one step through the `with_*` merges.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    email: String,
    gender: Option<Gender>,
    age: Option<u32>,
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    activity: Option<ActivityLevel>,
    cuisine: Option<String>,
    restrictions: Option<Restrictions>,
    goal: Option<Goal>,
}

impl ProfileDraft {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            gender: None,
            age: None,
            weight_kg: None,
            height_cm: None,
            activity: None,
            cuisine: None,
            restrictions: None,
            goal: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }
    pub fn age(&self) -> Option<u32> {
        self.age
    }
    pub fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }
    pub fn height_cm(&self) -> Option<f64> {
        self.height_cm
    }
    pub fn activity(&self) -> Option<ActivityLevel> {
        self.activity
    }
    pub fn cuisine(&self) -> Option<&str> {
        self.cuisine.as_deref()
    }
    pub fn restrictions(&self) -> Option<&Restrictions> {
        self.restrictions.as_ref()
    }
    pub fn goal(&self) -> Option<Goal> {
        self.goal
    }

    pub fn with_body(mut self, body: BodyMetrics) -> Self {
        self.gender = Some(body.gender);
        self.age = Some(body.age);
        self.weight_kg = Some(body.weight_kg);
        self.height_cm = Some(body.height_cm);
        self.activity = Some(body.activity);
        self
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = Some(restrictions);
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Names of fields still unset, in wizard order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.gender.is_none() {
            missing.push("gender");
        }
        if self.age.is_none() {
            missing.push("age");
        }
        if self.weight_kg.is_none() {
            missing.push("weight");
        }
        if self.height_cm.is_none() {
            missing.push("height");
        }
        if self.activity.is_none() {
            missing.push("activity level");
        }
        if self.cuisine.is_none() {
            missing.push("cuisine");
        }
        if self.restrictions.is_none() {
            missing.push("restrictions");
        }
        if self.goal.is_none() {
            missing.push("goal");
        }
        missing
    }

    /// Freeze the draft. Fails if any field is unset or any value falls
    /// outside what the field validators accept.
    pub fn complete(self) -> Result<CompleteProfile, WizardError> {
        let missing = self.missing_fields();
        let (
            Some(gender),
            Some(age),
            Some(weight_kg),
            Some(height_cm),
            Some(activity),
            Some(cuisine),
            Some(restrictions),
            Some(goal),
        ) = (
            self.gender,
            self.age,
            self.weight_kg,
            self.height_cm,
            self.activity,
            self.cuisine,
            self.restrictions,
            self.goal,
        )
        else {
            return Err(WizardError::Incomplete(missing.join(", ")));
        };

        let age = validate::age_value(age).map_err(|e| invalid("age", e))?;
        let weight_kg = validate::weight_kg_value(weight_kg).map_err(|e| invalid("weight", e))?;
        let height_cm = validate::height_cm_value(height_cm).map_err(|e| invalid("height", e))?;
        let cuisine = validate::cuisine(&cuisine).map_err(|e| invalid("cuisine", e))?;

        Ok(CompleteProfile {
            email: self.email,
            gender,
            age,
            weight_kg,
            height_cm,
            activity,
            cuisine: cuisine.to_string(),
            restrictions,
            goal,
        })
    }
}

fn invalid(field: &str, err: ValidationError) -> WizardError {
    WizardError::Invalid {
        field: field.to_string(),
        reason: err.message,
    }
}

/// A fully validated profile, ready for submission. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteProfile {
    email: String,
    gender: Gender,
    age: u32,
    weight_kg: f64,
    height_cm: f64,
    activity: ActivityLevel,
    cuisine: String,
    restrictions: Restrictions,
    goal: Goal,
}

impl CompleteProfile {
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn gender(&self) -> Gender {
        self.gender
    }
    pub fn age(&self) -> u32 {
        self.age
    }
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }
    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }
    pub fn activity(&self) -> ActivityLevel {
        self.activity
    }
    pub fn cuisine(&self) -> &str {
        &self.cuisine
    }
    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }
    pub fn goal(&self) -> Goal {
        self.goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> BodyMetrics {
        BodyMetrics {
            gender: Gender::Male,
            age: 25,
            weight_kg: 70.0,
            height_cm: 175.0,
            activity: ActivityLevel::Moderate,
        }
    }

    #[test]
    fn activity_factors() {
        assert_eq!(ActivityLevel::Sedentary.factor(), 1.3);
        assert_eq!(ActivityLevel::Light.factor(), 1.5);
        assert_eq!(ActivityLevel::Moderate.factor(), 1.7);
        assert_eq!(ActivityLevel::Active.factor(), 1.9);
    }

    #[test]
    fn enums_serialize_to_backend_labels() {
        assert_eq!(serde_json::to_string(&Goal::FatLoss).unwrap(), "\"Fat Loss\"");
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"Female\"");
        assert_eq!(
            serde_json::to_string(&ActivityLevel::Moderate).unwrap(),
            "\"moderate\""
        );
        for label in Goal::LABELS {
            let goal = Goal::from_label(label).unwrap();
            assert_eq!(goal.to_string(), *label);
        }
    }

    #[test]
    fn restrictions_trim_and_dedupe() {
        let r = Restrictions::from_parts(["Gluten", "Dairy"], [" Dairy ", "", "  ", "dairy"]);
        assert_eq!(r.len(), 3);
        assert!(r.contains("Dairy"));
        assert!(r.contains("dairy"));
        assert!(!r.iter().any(|e| e.is_empty()));
    }

    #[test]
    fn restrictions_survive_encode_decode() {
        let r = Restrictions::from_parts(["Gluten", "Dairy"], ["Sugar", "Nuts"]);
        let decoded = Restrictions::decode(&r.encode()).unwrap();
        assert_eq!(decoded, r);

        let expected = Restrictions::from_parts(["Nuts", "Sugar", "Dairy", "Gluten"], [""; 0]);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn draft_completes_only_when_every_field_is_set() {
        let draft = ProfileDraft::new("a@b.com").with_body(body()).with_cuisine("Italian");
        let err = draft.clone().complete().unwrap_err();
        assert_eq!(err, WizardError::Incomplete("restrictions, goal".into()));

        let profile = draft
            .with_restrictions(Restrictions::new())
            .with_goal(Goal::MuscleGain)
            .complete()
            .unwrap();
        assert_eq!(profile.email(), "a@b.com");
        assert_eq!(profile.goal(), Goal::MuscleGain);
        assert_eq!(profile.activity().factor(), 1.7);
    }

    fn filled(body: BodyMetrics, cuisine: &str) -> ProfileDraft {
        ProfileDraft::new("a@b.com")
            .with_body(body)
            .with_cuisine(cuisine)
            .with_restrictions(Restrictions::new())
            .with_goal(Goal::FatLoss)
    }

    #[test]
    fn out_of_range_values_never_complete() {
        let young = BodyMetrics { age: 5, ..body() };
        assert!(matches!(
            filled(young, "Italian").complete(),
            Err(WizardError::Invalid { ref field, .. }) if field == "age"
        ));

        let light = BodyMetrics { weight_kg: -3.0, ..body() };
        assert!(matches!(
            filled(light, "Italian").complete(),
            Err(WizardError::Invalid { ref field, .. }) if field == "weight"
        ));

        let unmeasured = BodyMetrics { height_cm: f64::NAN, ..body() };
        assert!(matches!(
            filled(unmeasured, "Italian").complete(),
            Err(WizardError::Invalid { ref field, .. }) if field == "height"
        ));
    }

    #[test]
    fn cuisine_outside_the_offered_set_never_completes() {
        let err = filled(body(), "Martian").complete().unwrap_err();
        assert!(matches!(err, WizardError::Invalid { ref field, .. } if field == "cuisine"));

        let profile = filled(body(), "italian").complete().unwrap();
        assert_eq!(profile.cuisine(), "Italian");
    }

    #[test]
    fn boundary_values_complete() {
        let edge = BodyMetrics {
            age: 60,
            weight_kg: 30.0,
            height_cm: 187.96,
            ..body()
        };
        let profile = filled(edge, "Thai").complete().unwrap();
        assert_eq!(profile.age(), 60);
        assert_eq!(profile.height_cm(), 187.96);
    }
}
