//! Scripted presentation shell.

use event_wizard_core::{FieldErrors, PresentationShell, ShellAction, SubmissionError, WizardView};
use std::collections::VecDeque;

/// Shell replaying a fixed list of actions and recording what it was shown.
///
/// Once the script runs out it answers [`ShellAction::Quit`].
#[derive(Debug, Default)]
pub struct ScriptedShell {
    actions: VecDeque<ShellAction>,
    rendered_steps: Vec<usize>,
    rendered_errors: Vec<FieldErrors>,
    failures: Vec<String>,
}

impl ScriptedShell {
    /// Shell that replays `actions` in order
    pub fn new(actions: impl IntoIterator<Item = ShellAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Queue one more action
    pub fn push(&mut self, action: ShellAction) {
        self.actions.push_back(action);
    }

    /// Step index of every render, in order
    pub fn rendered_steps(&self) -> &[usize] {
        &self.rendered_steps
    }

    /// Errors shown on every render, in order
    pub fn rendered_errors(&self) -> &[FieldErrors] {
        &self.rendered_errors
    }

    /// Display text of every reported submission failure
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Actions not consumed yet
    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl PresentationShell for ScriptedShell {
    fn render(&mut self, view: &WizardView<'_>) {
        self.rendered_steps.push(view.step_index);
        self.rendered_errors.push(view.errors.clone());
    }

    fn next_action(&mut self, _view: &WizardView<'_>) -> ShellAction {
        self.actions.pop_front().unwrap_or(ShellAction::Quit)
    }

    fn submission_failed(&mut self, error: &SubmissionError) {
        self.failures.push(error.to_string());
    }
}
