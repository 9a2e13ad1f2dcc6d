//! Form Controller — owns the form state and runs the submit flow.
//!
//! Flow: validate → single-flight check → throttle → build prompt →
//!       completion call (lock released) → parse → replace results.
//!
//! The controller lock is only ever held for the synchronous phases, so field
//! changes and view reads keep working while a completion call is in flight.
//!
//! Every reset starts a new epoch. A submission only writes back into the
//! epoch it started in, so a call still running across a reset is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::llm_client::{CompletionProvider, LlmError};
use crate::recommender::parser::parse_recommendations;
use crate::recommender::profile::{FormField, ProfileError, ProfileInput};
use crate::recommender::prompt::build_prompt;
use crate::recommender::throttle::SubmissionThrottle;
use crate::recommender::validation::{validate_profile, ValidationState};

pub type SharedController = Arc<Mutex<FormController>>;

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("Required fields are missing")]
    Validation(ValidationState),

    #[error("Submission throttled for another {retry_after_ms}ms")]
    Throttled { retry_after_ms: i64 },

    #[error("A submission is already in progress")]
    InFlight,
}

/// Snapshot of everything the form view renders.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub profile: ProfileInput,
    pub validation: ValidationState,
    pub messages: Vec<&'static str>,
    pub loading: bool,
    pub last_submit_ms: i64,
    pub recommendations: Vec<String>,
}

/// An accepted submission, ready for the completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmit {
    pub epoch: u64,
    pub prompt: String,
}

/// State of one mounted form.
#[derive(Debug, Default)]
pub struct FormController {
    epoch: u64,
    profile: ProfileInput,
    validation: ValidationState,
    throttle: SubmissionThrottle,
    loading: bool,
    recommendations: Vec<String>,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedController {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Returns to the mount state and starts a new epoch.
    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch.wrapping_add(1),
            ..Self::default()
        };
    }

    pub fn set_field(&mut self, field: FormField, value: &str) -> Result<(), ProfileError> {
        self.profile.set(field, value)
    }

    /// Applies several changes at once. If any value is rejected, none are applied.
    pub fn set_fields<'a>(
        &mut self,
        changes: impl IntoIterator<Item = (FormField, &'a str)>,
    ) -> Result<(), ProfileError> {
        let mut profile = self.profile.clone();
        for (field, value) in changes {
            profile.set(field, value)?;
        }
        self.profile = profile;
        Ok(())
    }

    /// Runs every check that precedes the network call and returns the prompt.
    ///
    /// On success the throttle timestamp is already updated and `loading` is set;
    /// the caller owns clearing it. On failure nothing but the validation flags changes.
    pub fn begin_submit(&mut self, now_ms: i64) -> Result<PendingSubmit, SubmitError> {
        self.validation = validate_profile(&self.profile);
        if !self.validation.passed() {
            return Err(SubmitError::Validation(self.validation));
        }
        if self.loading {
            return Err(SubmitError::InFlight);
        }
        self.throttle
            .try_acquire(now_ms)
            .map_err(|retry_after_ms| SubmitError::Throttled { retry_after_ms })?;

        self.loading = true;
        Ok(PendingSubmit {
            epoch: self.epoch,
            prompt: build_prompt(&self.profile),
        })
    }

    /// Replaces the result list wholesale.
    pub fn set_recommendations(&mut self, recommendations: Vec<String>) {
        self.recommendations = recommendations;
    }

    /// Stores the results of a submission, unless the form was reset since it began.
    fn apply_recommendations(&mut self, epoch: u64, recommendations: Vec<String>) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.recommendations = recommendations;
        true
    }

    fn finish_loading(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.loading = false;
        }
    }

    pub fn view(&self) -> FormView {
        FormView {
            profile: self.profile.clone(),
            validation: self.validation,
            messages: self.validation.messages(),
            loading: self.loading,
            last_submit_ms: self.throttle.last_submit_ms,
            recommendations: self.recommendations.clone(),
        }
    }
}

pub fn lock(controller: &SharedController) -> MutexGuard<'_, FormController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears `loading` for its epoch when dropped, whether the submit finished,
/// failed, or was cancelled.
struct LoadingGuard<'a> {
    controller: &'a SharedController,
    epoch: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.controller).finish_loading(self.epoch);
    }
}

/// Submits the form. Completion failures are logged and swallowed: the result
/// list keeps its previous value and the view is returned as usual.
pub async fn submit(
    controller: &SharedController,
    completion: &dyn CompletionProvider,
    now_ms: i64,
) -> Result<FormView, SubmitError> {
    let PendingSubmit { epoch, prompt } = lock(controller).begin_submit(now_ms)?;
    let loading = LoadingGuard { controller, epoch };

    info!("Requesting college recommendations");
    match fetch_recommendations(completion, &prompt).await {
        Ok(recommendations) => {
            let count = recommendations.len();
            if lock(controller).apply_recommendations(epoch, recommendations) {
                info!("Received {count} recommendations");
            } else {
                warn!("Form was reset during the request; discarding {count} recommendations");
            }
        }
        Err(e) => error!("Error fetching recommendations: {e}"),
    }

    drop(loading);
    Ok(lock(controller).view())
}

async fn fetch_recommendations(
    completion: &dyn CompletionProvider,
    prompt: &str,
) -> Result<Vec<String>, LlmError> {
    let response = completion.complete(prompt).await?;
    let text = response.first_text()?;
    Ok(parse_recommendations(text, prompt))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::llm_client::{parse_completion, CompletionResponse};

    const T0: i64 = 1_760_000_000_000;

    /// Replies with a fixed body, echoing the prompt where `{prompt}` appears.
    struct ScriptedCompletion {
        body: String,
        calls: AtomicUsize,
    }

    impl ScriptedCompletion {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = serde_json::to_string(prompt)?;
            let body = self.body.replace("\"{prompt}", &text[..text.len() - 1]);
            parse_completion(&body)
        }
    }

    /// Observes the controller mid-call, then fails like a dropped connection.
    struct ObservingFailure {
        controller: SharedController,
        seen_loading: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for ObservingFailure {
        async fn complete(&self, _prompt: &str) -> Result<CompletionResponse, LlmError> {
            if lock(&self.controller).view().loading {
                self.seen_loading.fetch_add(1, Ordering::SeqCst);
            }
            Err(LlmError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            })
        }
    }

    /// Holds the call open until released, then answers with one college.
    struct GatedCompletion {
        entered: Notify,
        release: Notify,
    }

    impl GatedCompletion {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                entered: Notify::new(),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for GatedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<CompletionResponse, LlmError> {
            self.entered.notify_one();
            self.release.notified().await;
            parse_completion(r#"{"choices":[{"text":"Stale U"}]}"#)
        }
    }

    fn spawn_submit(
        controller: &SharedController,
        completion: &Arc<GatedCompletion>,
    ) -> tokio::task::JoinHandle<Result<FormView, SubmitError>> {
        let controller = controller.clone();
        let completion = completion.clone();
        tokio::spawn(async move { submit(&controller, completion.as_ref(), T0).await })
    }

    fn filled_controller() -> SharedController {
        let controller = FormController::shared();
        {
            let mut c = lock(&controller);
            c.set_field(FormField::Grade, "12").unwrap();
            c.set_field(FormField::Gpa, "3.5 - 4.0").unwrap();
            c.set_field(FormField::Hobby, "robotics").unwrap();
        }
        controller
    }

    #[tokio::test]
    async fn test_successful_submit_strips_echo() {
        let controller = filled_controller();
        let completion =
            ScriptedCompletion::new(r#"{"choices":[{"text":"{prompt}\nHarvard, MIT, Stanford"}]}"#);

        let view = submit(&controller, &completion, T0).await.unwrap();

        assert_eq!(view.recommendations, vec!["Harvard", "MIT", "Stanford"]);
        assert_eq!(view.last_submit_ms, T0);
        assert!(!view.loading);
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_block_submit() {
        for mask in 1u8..8 {
            let controller = filled_controller();
            lock(&controller).set_recommendations(vec!["Previous".to_string()]);
            {
                let mut c = lock(&controller);
                if mask & 1 != 0 {
                    c.set_field(FormField::Grade, "").unwrap();
                }
                if mask & 2 != 0 {
                    c.set_field(FormField::Gpa, "").unwrap();
                }
                if mask & 4 != 0 {
                    c.set_field(FormField::Hobby, "").unwrap();
                }
            }
            let completion = ScriptedCompletion::new(r#"{"choices":[{"text":"Yale"}]}"#);

            let err = submit(&controller, &completion, T0).await.unwrap_err();

            let expected = ValidationState {
                grade_error: mask & 1 != 0,
                gpa_error: mask & 2 != 0,
                hobby_error: mask & 4 != 0,
            };
            assert_eq!(err, SubmitError::Validation(expected));
            let view = lock(&controller).view();
            assert_eq!(view.validation, expected);
            assert_eq!(view.recommendations, vec!["Previous"]);
            assert_eq!(view.last_submit_ms, 0);
            assert!(!view.loading);
            assert_eq!(completion.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_validation_flags_clear_after_fix() {
        let controller = FormController::shared();
        let completion = ScriptedCompletion::new(r#"{"choices":[{"text":"Yale"}]}"#);
        assert!(submit(&controller, &completion, T0).await.is_err());
        assert_eq!(lock(&controller).view().messages.len(), 3);

        {
            let mut c = lock(&controller);
            c.set_field(FormField::Grade, "9").unwrap();
            c.set_field(FormField::Gpa, "2.5 or lower").unwrap();
            c.set_field(FormField::Hobby, "art").unwrap();
        }
        let view = submit(&controller, &completion, T0).await.unwrap();
        assert!(view.validation.passed());
        assert!(view.messages.is_empty());
        assert_eq!(view.recommendations, vec!["Yale"]);
    }

    #[tokio::test]
    async fn test_second_submit_within_window_throttled() {
        let controller = filled_controller();
        let completion = ScriptedCompletion::new(r#"{"choices":[{"text":"Brown"}]}"#);

        submit(&controller, &completion, T0).await.unwrap();
        let err = submit(&controller, &completion, T0 + 3_000).await.unwrap_err();

        assert_eq!(err, SubmitError::Throttled { retry_after_ms: 7_000 });
        assert_eq!(completion.calls(), 1);
        assert_eq!(lock(&controller).view().last_submit_ms, T0);

        submit(&controller, &completion, T0 + 10_000).await.unwrap();
        assert_eq!(completion.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_choices_keep_previous_results() {
        let controller = filled_controller();
        lock(&controller).set_recommendations(vec!["Cornell".to_string()]);
        let completion = ScriptedCompletion::new(r#"{"choices":[]}"#);

        let view = submit(&controller, &completion, T0).await.unwrap();

        assert_eq!(view.recommendations, vec!["Cornell"]);
        assert!(!view.loading);
        assert_eq!(view.last_submit_ms, T0);
    }

    #[tokio::test]
    async fn test_absent_choices_keep_previous_results() {
        let controller = filled_controller();
        lock(&controller).set_recommendations(vec!["Cornell".to_string()]);
        let completion = ScriptedCompletion::new(r#"{"error":"nope"}"#);

        let view = submit(&controller, &completion, T0).await.unwrap();

        assert_eq!(view.recommendations, vec!["Cornell"]);
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_loading_set_during_call_and_cleared_on_failure() {
        let controller = filled_controller();
        let completion = ObservingFailure {
            controller: controller.clone(),
            seen_loading: AtomicUsize::new(0),
        };

        let view = submit(&controller, &completion, T0).await.unwrap();

        assert_eq!(completion.seen_loading.load(Ordering::SeqCst), 1);
        assert!(!view.loading);
        assert!(view.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_submit_rejected_without_touching_throttle() {
        let controller = filled_controller();
        lock(&controller).begin_submit(T0).unwrap();

        let completion = ScriptedCompletion::new(r#"{"choices":[{"text":"Yale"}]}"#);
        let err = submit(&controller, &completion, T0 + 60_000)
            .await
            .unwrap_err();

        assert_eq!(err, SubmitError::InFlight);
        assert_eq!(lock(&controller).view().last_submit_ms, T0);
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_candidate_yields_empty_list() {
        let controller = filled_controller();
        lock(&controller).set_recommendations(vec!["Old".to_string()]);
        let completion = ScriptedCompletion::new(r#"{"choices":[{"text":"{prompt}"}]}"#);

        let view = submit(&controller, &completion, T0).await.unwrap();

        assert!(view.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_reset_during_call_discards_results() {
        let controller = filled_controller();
        let completion = GatedCompletion::new();

        let task = spawn_submit(&controller, &completion);
        completion.entered.notified().await;
        assert!(lock(&controller).view().loading);

        lock(&controller).reset();
        completion.release.notify_one();
        task.await.unwrap().unwrap();

        let view = lock(&controller).view();
        assert!(view.recommendations.is_empty());
        assert!(!view.loading);
        assert_eq!(view.last_submit_ms, 0);
        assert_eq!(view.profile, ProfileInput::default());
    }

    #[tokio::test]
    async fn test_stale_call_does_not_clear_newer_loading() {
        let controller = filled_controller();
        let completion = GatedCompletion::new();

        let task = spawn_submit(&controller, &completion);
        completion.entered.notified().await;

        {
            let mut c = lock(&controller);
            c.reset();
            c.set_fields([
                (FormField::Grade, "10"),
                (FormField::Gpa, "3.0 - 3.5"),
                (FormField::Hobby, "swimming"),
            ])
            .unwrap();
            c.begin_submit(T0 + 1).unwrap();
        }

        completion.release.notify_one();
        task.await.unwrap().unwrap();

        let view = lock(&controller).view();
        assert!(view.loading);
        assert_eq!(view.last_submit_ms, T0 + 1);
        assert!(view.recommendations.is_empty());
    }

    #[test]
    fn test_set_fields_is_all_or_nothing() {
        let mut controller = FormController::new();
        let err = controller
            .set_fields([
                (FormField::Grade, "9"),
                (FormField::Hobby, "chess"),
                (FormField::Gpa, "5.0"),
            ])
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidOption { field: FormField::Gpa, .. }));
        assert_eq!(controller.view().profile, ProfileInput::default());

        controller
            .set_fields([(FormField::Grade, "9"), (FormField::Hobby, "chess")])
            .unwrap();
        assert_eq!(controller.view().profile.hobby, "chess");
    }

    #[test]
    fn test_reset_advances_epoch() {
        let mut controller = FormController::new();
        controller.set_field(FormField::Hobby, "chess").unwrap();
        controller.reset();
        assert_eq!(controller.epoch, 1);
        assert!(!controller.apply_recommendations(0, vec!["Old".to_string()]));
        assert!(controller.apply_recommendations(1, vec!["New".to_string()]));
        assert_eq!(controller.view().recommendations, vec!["New"]);
    }
}
