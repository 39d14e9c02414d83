//! Submission orchestrator — turns a complete profile into the two ordered
//! backend calls and reports progress.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{DietPlanApi, PlanRequest, PlanResponse, ProfileRecord};
use crate::error::SubmissionError;
use crate::navigation::{Navigator, Route, Terminal};

use super::model::CompleteProfile;

const UPDATE_CAPACITY: usize = 16;

/// Idle → CreatingPlan → PersistingProfile → Complete | Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    CreatingPlan,
    PersistingProfile,
    Complete,
    Failed,
}

impl SubmissionPhase {
    pub fn can_transition_to(&self, target: SubmissionPhase) -> bool {
        use SubmissionPhase::*;
        matches!(
            (self, target),
            (Idle, CreatingPlan)
                | (CreatingPlan, PersistingProfile)
                | (PersistingProfile, Complete)
                | (CreatingPlan, Failed)
                | (PersistingProfile, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Fraction shown on the progress bar when entering this phase.
    pub fn progress(&self) -> Option<f32> {
        match self {
            Self::Idle => Some(0.0),
            Self::CreatingPlan => Some(0.2),
            Self::PersistingProfile => Some(0.6),
            Self::Complete => Some(1.0),
            Self::Failed => None,
        }
    }
}

impl std::fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::CreatingPlan => "creating_plan",
            Self::PersistingProfile => "persisting_profile",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Progress event published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionUpdate {
    pub submission_id: Uuid,
    pub phase: SubmissionPhase,
    pub progress: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub submission_id: Uuid,
    pub email: String,
    pub plan: PlanResponse,
    pub saved: serde_json::Value,
    pub finished_at: DateTime<Utc>,
}

struct Progress {
    phase: SubmissionPhase,
    fraction: f32,
}

/// Runs one profile submission. A failed or finished orchestrator is not
/// reused; a retry starts a new one.
pub struct SubmissionOrchestrator {
    id: Uuid,
    api: Arc<dyn DietPlanApi>,
    navigator: Arc<dyn Navigator>,
    completion_delay: Duration,
    progress: RwLock<Progress>,
    tx: broadcast::Sender<SubmissionUpdate>,
}

impl SubmissionOrchestrator {
    pub fn new(
        api: Arc<dyn DietPlanApi>,
        navigator: Arc<dyn Navigator>,
        completion_delay: Duration,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            api,
            navigator,
            completion_delay,
            progress: RwLock::new(Progress {
                phase: SubmissionPhase::Idle,
                fraction: 0.0,
            }),
            tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionUpdate> {
        self.tx.subscribe()
    }

    pub async fn phase(&self) -> SubmissionPhase {
        self.progress.read().await.phase
    }

    pub async fn progress(&self) -> f32 {
        self.progress.read().await.fraction
    }

    /// Move to `phase` and publish the update. Returns `false` (and changes
    /// nothing) if the transition is not allowed from the current phase.
    async fn enter(&self, phase: SubmissionPhase, message: Option<String>) -> bool {
        let mut progress = self.progress.write().await;
        if !progress.phase.can_transition_to(phase) {
            warn!(
                submission_id = %self.id,
                from = %progress.phase,
                to = %phase,
                "Ignoring invalid submission transition"
            );
            return false;
        }
        progress.phase = phase;
        if let Some(fraction) = phase.progress() {
            progress.fraction = fraction;
        }

        // ok if nobody is listening
        let _ = self.tx.send(SubmissionUpdate {
            submission_id: self.id,
            phase,
            progress: progress.fraction,
            message,
        });
        true
    }

    /// Submit the profile: create the plan, then persist the profile merged
    /// with the plan, then route to the success screen after the completion
    /// delay.
    ///
    /// Any call failure routes to the failure screen. Cancellation aborts the
    /// in-flight call and does not navigate anywhere.
    pub async fn submit(
        &self,
        profile: CompleteProfile,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReport, SubmissionError> {
        if !self.enter(SubmissionPhase::CreatingPlan, None).await {
            return Err(SubmissionError::AlreadyStarted {
                phase: self.phase().await.to_string(),
            });
        }
        let email = profile.email().to_string();
        info!(submission_id = %self.id, email = %email, "Submitting profile");

        let request = PlanRequest::from(&profile);
        let plan = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.cancelled().await),
            result = self.api.create_plan(&request) => result,
        };
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => return Err(self.fail(&email, SubmissionError::CreatePlan(e)).await),
        };
        info!(
            submission_id = %self.id,
            bmi = plan.bmi,
            calories = plan.calories,
            "Plan created"
        );

        self.enter(SubmissionPhase::PersistingProfile, None).await;
        let record = ProfileRecord::merge(&profile, plan.clone());
        let saved = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.cancelled().await),
            result = self.api.save_profile(&record) => result,
        };
        let saved = match saved {
            Ok(saved) => saved,
            Err(e) => return Err(self.fail(&email, SubmissionError::PersistProfile(e)).await),
        };

        self.enter(SubmissionPhase::Complete, None).await;
        info!(submission_id = %self.id, email = %email, "Profile submission complete");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(submission_id = %self.id, "Cancelled before leaving progress screen");
                return Err(SubmissionError::Cancelled);
            }
            _ = tokio::time::sleep(self.completion_delay) => {}
        }
        self.navigator
            .navigate(Route::Terminal(Terminal::Success { email: email.clone() }));

        Ok(SubmissionReport {
            submission_id: self.id,
            email,
            plan,
            saved,
            finished_at: Utc::now(),
        })
    }

    async fn fail(&self, email: &str, err: SubmissionError) -> SubmissionError {
        let reason = err.to_string();
        warn!(submission_id = %self.id, email = %email, error = %reason, "Profile submission failed");
        self.enter(SubmissionPhase::Failed, Some(reason.clone()))
            .await;
        self.navigator.navigate(Route::Terminal(Terminal::Failure {
            email: email.to_string(),
            reason,
        }));
        err
    }

    async fn cancelled(&self) -> SubmissionError {
        info!(submission_id = %self.id, "Submission cancelled");
        self.enter(SubmissionPhase::Failed, Some("cancelled".into()))
            .await;
        SubmissionError::Cancelled
    }
}
