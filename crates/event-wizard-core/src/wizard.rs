//! Wizard state machine.
//!
//! The wizard owns the step index, the last navigation direction and the
//! accumulated form values. It only moves one step at a time, and on the
//! terminal step `advance` submits instead of moving.
//!
//! At most one submission is in flight. Calls to `advance` made while an
//! attempt is unresolved are ignored and reported as
//! [`AdvanceOutcome::Ignored`].

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{SubmissionError, WizardError, WizardResult};
use crate::steps::{StepDefinition, StepRegistry};
use crate::submission::{EventApi, SubmissionDefaults, SubmissionPipeline, SubmissionReceipt};
use crate::validation::{FieldErrors, ValidationEngine};
use crate::values::FormValues;

/// Last navigation delta, used only for presentation cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// No navigation yet
    #[default]
    None,
    /// Moved to the next step
    Forward,
    /// Moved to the previous step
    Backward,
}

impl Direction {
    /// Signed delta (`+1`, `-1`, or `0`)
    pub fn delta(&self) -> i8 {
        match self {
            Direction::None => 0,
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Mutable state of one wizard instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    step_index: usize,
    direction: Direction,
    form_values: FormValues,
}

impl WizardState {
    /// Index of the active step
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Last navigation direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Values accumulated across visited steps
    pub fn form_values(&self) -> &FormValues {
        &self.form_values
    }
}

/// Result of an `advance` call
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Moved to the next step
    Moved {
        /// New active step
        step_index: usize,
    },
    /// Terminal step submitted successfully
    Submitted(SubmissionReceipt),
    /// A submission was already in flight; nothing happened
    Ignored,
}

/// Everything a presentation shell needs to draw the active step
#[derive(Debug)]
pub struct WizardView<'a> {
    /// Active step index
    pub step_index: usize,
    /// Number of steps
    pub step_count: usize,
    /// Active step definition
    pub step: &'a StepDefinition,
    /// Errors from the last rejected `advance`
    pub errors: &'a FieldErrors,
    /// Accumulated form values
    pub values: FormValues,
    /// Last navigation direction
    pub direction: Direction,
    /// Completion ratio in `[0, 1]`
    pub progress: f32,
    /// Whether a submission is in flight
    pub submitting: bool,
}

impl WizardView<'_> {
    /// Whether the active step is the terminal one
    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 == self.step_count
    }

    /// Whether a back control should be offered
    pub fn can_retreat(&self) -> bool {
        self.step_index > 0
    }
}

/// What the user asked for after editing the active step
#[derive(Debug, Clone, PartialEq)]
pub enum ShellAction {
    /// Validate the edited values and move on (or submit on the last step)
    Next(FormValues),
    /// Go back one step
    Back,
    /// Leave the wizard
    Quit,
}

/// Renders the wizard and collects user edits
pub trait PresentationShell {
    /// Draw the active step
    fn render(&mut self, view: &WizardView<'_>);

    /// Collect edits for the active step and the requested navigation
    fn next_action(&mut self, view: &WizardView<'_>) -> ShellAction;

    /// Report a failed submission attempt
    fn submission_failed(&mut self, error: &SubmissionError);
}

/// Holds the in-flight flag and the attempt's cancellation token. Both are
/// cleared when dropped, including when the submitting future is dropped
/// mid-flight.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    cancel: &'a Mutex<Option<CancellationToken>>,
    token: CancellationToken,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, cancel: &'a Mutex<Option<CancellationToken>>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let token = CancellationToken::new();
        *cancel.lock() = Some(token.clone());
        Some(Self { flag, cancel, token })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.cancel.lock().take();
        self.flag.store(false, Ordering::Release);
    }
}

/// The wizard state machine
#[derive(Debug)]
pub struct Wizard {
    registry: Arc<StepRegistry>,
    engine: ValidationEngine,
    pipeline: SubmissionPipeline,
    owner_id: String,
    state: Mutex<WizardState>,
    in_flight: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Wizard {
    /// Create a wizard at step 0.
    ///
    /// Fails when the registry has no file field to upload.
    pub fn new(
        registry: Arc<StepRegistry>,
        api: Arc<dyn EventApi>,
        owner_id: impl Into<String>,
    ) -> WizardResult<Self> {
        let asset_field = registry.asset_field().ok_or_else(|| {
            WizardError::InvalidRegistry("no step collects a file to upload".to_string())
        })?;

        Ok(Self {
            engine: ValidationEngine::new(registry.clone()),
            pipeline: SubmissionPipeline::new(api, asset_field),
            registry,
            owner_id: owner_id.into(),
            state: Mutex::new(WizardState::default()),
            in_flight: AtomicBool::new(false),
            cancel: Mutex::new(None),
        })
    }

    /// Override the fixed record fields sent on submission
    pub fn with_defaults(mut self, defaults: SubmissionDefaults) -> Self {
        self.pipeline = self.pipeline.with_defaults(defaults);
        self
    }

    /// Seed form values (e.g. a default end date) before the first step
    pub fn with_initial_values(self, values: FormValues) -> Self {
        self.state.lock().form_values.merge(values);
        self
    }

    /// Step registry
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Snapshot of the current state
    pub fn state(&self) -> WizardState {
        self.state.lock().clone()
    }

    /// Active step index
    pub fn step_index(&self) -> usize {
        self.state.lock().step_index
    }

    /// Last navigation direction
    pub fn direction(&self) -> Direction {
        self.state.lock().direction
    }

    /// Snapshot of the accumulated values
    pub fn form_values(&self) -> FormValues {
        self.state.lock().form_values.clone()
    }

    /// Whether a submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Completion ratio, `step_index / (N - 1)`
    pub fn progress(&self) -> f32 {
        let last = self.registry.last_index();
        if last == 0 {
            return 1.0;
        }
        self.step_index() as f32 / last as f32
    }

    /// View of the active step for a presentation shell
    pub fn view<'a>(&'a self, errors: &'a FieldErrors) -> WizardView<'a> {
        let state = self.state();
        let step = &self.registry.steps()[state.step_index];
        WizardView {
            step_index: state.step_index,
            step_count: self.registry.len(),
            step,
            errors,
            values: state.form_values,
            direction: state.direction,
            progress: self.progress(),
            submitting: self.is_submitting(),
        }
    }

    /// Validate the active step and move forward, or submit on the last step.
    ///
    /// Rejected values leave the state untouched and come back as
    /// [`WizardError::Validation`].
    pub async fn advance(&self, candidate: &FormValues) -> WizardResult<AdvanceOutcome> {
        if self.is_submitting() {
            warn!("Submission already in flight, ignoring advance");
            return Ok(AdvanceOutcome::Ignored);
        }

        let step_index = self.step_index();
        let validated = self.engine.validate(step_index, candidate).map_err(|e| {
            debug!(step_index, error = %e, "Step rejected");
            e
        })?;

        if step_index < self.registry.last_index() {
            let mut state = self.state.lock();
            if state.step_index != step_index {
                warn!(step_index, "Step changed during validation, ignoring advance");
                return Ok(AdvanceOutcome::Ignored);
            }
            validated.apply_to(&mut state.form_values);
            state.step_index += 1;
            state.direction = Direction::Forward;
            info!(step_index = state.step_index, "Advanced to next step");
            return Ok(AdvanceOutcome::Moved {
                step_index: state.step_index,
            });
        }

        // Step check and guard acquisition share the state lock; retreat
        // checks the flag under the same lock.
        let (guard, snapshot) = {
            let mut state = self.state.lock();
            if state.step_index != step_index {
                warn!(step_index, "Step changed during validation, ignoring advance");
                return Ok(AdvanceOutcome::Ignored);
            }
            let Some(guard) = InFlightGuard::acquire(&self.in_flight, &self.cancel) else {
                warn!("Submission already in flight, ignoring advance");
                return Ok(AdvanceOutcome::Ignored);
            };
            validated.apply_to(&mut state.form_values);
            (guard, state.form_values.clone())
        };

        info!("Submitting event");
        let result = self
            .pipeline
            .submit(&snapshot, &self.owner_id, &guard.token)
            .await;
        drop(guard);

        Ok(AdvanceOutcome::Submitted(result?))
    }

    /// Go back one step. No-op on the first step and while submitting.
    ///
    /// Values entered on the step being left are kept.
    pub fn retreat(&self) -> bool {
        let mut state = self.state.lock();
        if self.is_submitting() {
            warn!("Submission in flight, ignoring retreat");
            return false;
        }
        if state.step_index == 0 {
            return false;
        }
        state.step_index -= 1;
        state.direction = Direction::Backward;
        info!(step_index = state.step_index, "Went back one step");
        true
    }

    /// Cancel the in-flight submission at its next phase boundary
    pub fn cancel_submission(&self) -> bool {
        match self.cancel.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drive the wizard with a presentation shell until the event is created
    /// or the user quits.
    ///
    /// Submission failures are reported to the shell and the user stays on the
    /// terminal step, free to retry.
    pub async fn run<S>(&self, shell: &mut S) -> WizardResult<Option<SubmissionReceipt>>
    where
        S: PresentationShell + ?Sized,
    {
        let mut errors = FieldErrors::new();

        loop {
            let action = {
                let view = self.view(&errors);
                shell.render(&view);
                shell.next_action(&view)
            };

            match action {
                ShellAction::Quit => return Ok(None),
                ShellAction::Back => {
                    self.retreat();
                    errors = FieldErrors::new();
                }
                ShellAction::Next(edits) => {
                    let mut candidate = self.form_values();
                    candidate.merge(edits);

                    match self.advance(&candidate).await {
                        Ok(AdvanceOutcome::Submitted(receipt)) => return Ok(Some(receipt)),
                        Ok(_) => errors = FieldErrors::new(),
                        Err(WizardError::Validation(field_errors)) => errors = field_errors,
                        Err(WizardError::Submission(err)) => {
                            errors = FieldErrors::new();
                            shell.submission_failed(&err);
                        }
                        Err(other) => return Err(other),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionResult;
    use crate::schema::FieldRule;
    use crate::steps::{event_steps, fields};
    use crate::submission::{SubmissionRecord, UploadTarget};
    use crate::values::FileAsset;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    #[derive(Debug, Default)]
    struct NullApi;

    #[async_trait]
    impl EventApi for NullApi {
        async fn presign(&self, _filename: &str, _media_type: &str) -> SubmissionResult<UploadTarget> {
            UploadTarget::parse("https://bucket.example.com/poster.png?sig=1", None)
        }

        async fn upload(&self, _target: &UploadTarget, _asset: &FileAsset) -> SubmissionResult<()> {
            Ok(())
        }

        async fn create(&self, _record: &SubmissionRecord) -> SubmissionResult<Value> {
            Ok(json!({"id": 1}))
        }
    }

    fn wizard() -> Wizard {
        Wizard::new(event_steps(), Arc::new(NullApi), "user-1").unwrap()
    }

    fn general_info() -> FormValues {
        FormValues::new()
            .with(fields::NAME, "Concert")
            .with(fields::ADDRESS, "1 Rue X")
            .with(fields::ZIP_CODE, "75001")
            .with(fields::CITY, "Paris")
    }

    #[tokio::test]
    async fn test_advance_moves_forward() {
        let wizard = wizard();
        let outcome = wizard.advance(&general_info()).await.unwrap();

        assert_eq!(outcome, AdvanceOutcome::Moved { step_index: 1 });
        assert_eq!(wizard.direction(), Direction::Forward);
        assert_eq!(wizard.form_values().text(fields::CITY), Some("Paris"));
    }

    #[tokio::test]
    async fn test_invalid_advance_keeps_state() {
        let wizard = wizard();
        let err = wizard
            .advance(&general_info().with(fields::ZIP_CODE, "ABCDE"))
            .await
            .unwrap_err();

        assert!(err.field_errors().unwrap().contains(fields::ZIP_CODE));
        assert_eq!(wizard.state(), WizardState::default());
    }

    #[tokio::test]
    async fn test_retreat() {
        let wizard = wizard();
        assert!(!wizard.retreat());
        assert_eq!(wizard.step_index(), 0);
        assert_eq!(wizard.direction(), Direction::None);

        wizard.advance(&general_info()).await.unwrap();
        assert!(wizard.retreat());
        assert_eq!(wizard.step_index(), 0);
        assert_eq!(wizard.direction(), Direction::Backward);
        assert_eq!(wizard.form_values().text(fields::NAME), Some("Concert"));
    }

    #[test]
    fn test_progress() {
        let wizard = wizard();
        assert_eq!(wizard.progress(), 0.0);
        wizard.state.lock().step_index = 2;
        assert_eq!(wizard.progress(), 0.5);
        wizard.state.lock().step_index = 4;
        assert_eq!(wizard.progress(), 1.0);
    }

    #[test]
    fn test_registry_without_file_field_is_rejected() {
        let registry = StepRegistry::new(vec![StepDefinition::new("only", "")
            .field("name", FieldRule::RequiredText { message: "required" })])
        .unwrap();

        let err = Wizard::new(Arc::new(registry), Arc::new(NullApi), "user-1").unwrap_err();
        assert!(matches!(err, WizardError::InvalidRegistry(_)));
    }

    #[test]
    fn test_initial_values_are_visible() {
        let wizard = wizard().with_initial_values(FormValues::new().with(fields::ENDING_DATE, "2024-06-02"));
        let errors = FieldErrors::new();
        let view = wizard.view(&errors);

        assert_eq!(view.values.text(fields::ENDING_DATE), Some("2024-06-02"));
        assert_eq!(view.step_count, 5);
        assert!(!view.can_retreat());
        assert!(!view.is_last_step());
    }

    #[test]
    fn test_in_flight_guard_resets_on_drop() {
        let flag = AtomicBool::new(false);
        let cancel = Mutex::new(None);
        {
            let guard = InFlightGuard::acquire(&flag, &cancel);
            assert!(guard.is_some());
            assert!(cancel.lock().is_some());
            assert!(InFlightGuard::acquire(&flag, &cancel).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(cancel.lock().is_none());
    }
}
