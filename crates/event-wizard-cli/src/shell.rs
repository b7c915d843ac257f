//! Line-oriented presentation shell.
//!
//! Each step is printed with a progress bar, its title, subtitle and the
//! errors of the last rejected attempt, then every widget is prompted for on
//! its own line. An empty answer keeps the current value and `:clear` empties
//! it. `:back` goes to the previous step and `:quit` leaves the wizard.

use event_wizard_core::{
    FieldValue, FieldWidget, FileAsset, FormValues, PresentationShell, ShellAction,
    SubmissionError, WidgetKind, WizardView,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, warn};

const BACK_COMMAND: &str = ":back";
const QUIT_COMMAND: &str = ":quit";
const CLEAR_COMMAND: &str = ":clear";
const PROGRESS_WIDTH: usize = 20;

/// Media type of an image file, from its extension
pub fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

enum Answer {
    Value(String),
    Keep,
    Clear,
    Back,
    Quit,
}

/// Terminal shell reading answers from `input` and drawing on `output`
#[derive(Debug)]
pub struct TerminalShell<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalShell<R, W> {
    /// Shell over the given streams
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.output, "{}", line) {
            debug!("Failed to write to terminal: {}", e);
        }
    }

    fn prompt(&mut self, widget: &FieldWidget, current: Option<&FieldValue>) -> io::Result<()> {
        write!(self.output, "{}", widget.label)?;
        if let Some(placeholder) = widget.placeholder {
            write!(self.output, " - {}", placeholder)?;
        }
        if widget.end_icon == Some("euro") {
            write!(self.output, " (€)")?;
        }
        if widget.kind == WidgetKind::Image {
            write!(self.output, " [chemin du fichier]")?;
        }
        if let Some(value) = current {
            write!(self.output, " [{}]", value)?;
        }
        write!(self.output, ": ")?;
        self.output.flush()
    }

    fn read_answer(&mut self) -> Answer {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Answer::Quit,
            Ok(_) => match line.trim() {
                BACK_COMMAND => Answer::Back,
                QUIT_COMMAND => Answer::Quit,
                CLEAR_COMMAND => Answer::Clear,
                "" => Answer::Keep,
                _ => Answer::Value(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string()),
            },
            Err(e) => {
                warn!("Failed to read answer: {}", e);
                Answer::Quit
            }
        }
    }

    /// Turn an answer into a field value. Unreadable image paths stay text so
    /// that validation reports them.
    fn field_value(&mut self, widget: &FieldWidget, answer: String) -> FieldValue {
        match widget.kind {
            WidgetKind::Image => {
                let path = Path::new(answer.trim());
                match fs::read(path) {
                    Ok(bytes) => {
                        let name = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("image")
                            .to_string();
                        FileAsset::new(name, media_type_for(path), bytes).into()
                    }
                    Err(e) => {
                        self.write_line(&format!(
                            "  Impossible de lire {}: {}",
                            path.display(),
                            e
                        ));
                        FieldValue::Text(answer)
                    }
                }
            }
            _ => {
                let text = match widget.max_length {
                    Some(max) => answer.chars().take(max).collect(),
                    None => answer,
                };
                FieldValue::Text(text)
            }
        }
    }
}

fn progress_bar(progress: f32) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * PROGRESS_WIDTH as f32).round()) as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

impl<R: BufRead, W: Write> PresentationShell for TerminalShell<R, W> {
    fn render(&mut self, view: &WizardView<'_>) {
        self.write_line("");
        self.write_line(&format!(
            "{} Étape {}/{}",
            progress_bar(view.progress),
            view.step_index + 1,
            view.step_count
        ));
        self.write_line(view.step.title);
        if !view.step.subtitle.is_empty() {
            self.write_line(view.step.subtitle);
        }
        for error in view.errors.iter() {
            self.write_line(&format!("  ! {}", error.message));
        }

        let mut hint = format!(
            "(entrée pour garder la valeur actuelle, {} pour l'effacer",
            CLEAR_COMMAND
        );
        if view.can_retreat() {
            hint.push_str(&format!(", {} pour revenir", BACK_COMMAND));
        }
        hint.push_str(&format!(", {} pour quitter)", QUIT_COMMAND));
        self.write_line(&hint);
    }

    fn next_action(&mut self, view: &WizardView<'_>) -> ShellAction {
        let mut edits = FormValues::new();

        for widget in &view.step.render.widgets {
            if let Err(e) = self.prompt(widget, view.values.get(widget.field)) {
                warn!("Failed to write prompt: {}", e);
                return ShellAction::Quit;
            }
            match self.read_answer() {
                Answer::Value(answer) => {
                    let value = self.field_value(widget, answer);
                    edits.insert(widget.field, value);
                }
                Answer::Keep => {}
                Answer::Clear => edits.insert(widget.field, FieldValue::Text(String::new())),
                Answer::Back => return ShellAction::Back,
                Answer::Quit => return ShellAction::Quit,
            }
        }

        if view.is_last_step() {
            self.write_line("Création de l'événement...");
        }
        ShellAction::Next(edits)
    }

    fn submission_failed(&mut self, error: &SubmissionError) {
        self.write_line(&format!(
            "Échec de l'envoi (étape {}): {}",
            error.phase(),
            error
        ));
        self.write_line("Validez à nouveau pour réessayer.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_wizard_core::{event_steps, fields, Direction, FieldErrors, StepRegistry};
    use std::io::Cursor;

    fn view<'a>(
        registry: &'a StepRegistry,
        step_index: usize,
        errors: &'a FieldErrors,
        values: FormValues,
    ) -> WizardView<'a> {
        WizardView {
            step_index,
            step_count: registry.len(),
            step: &registry.steps()[step_index],
            errors,
            values,
            direction: Direction::None,
            progress: step_index as f32 / 4.0,
            submitting: false,
        }
    }

    fn shell(input: &str) -> TerminalShell<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalShell::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("poster.PNG")), "image/png");
        assert_eq!(media_type_for(Path::new("poster.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("poster.jpg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("noextension")), "application/octet-stream");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(0.5), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(1.0), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn test_collects_every_widget() {
        let registry = event_steps();
        let errors = FieldErrors::new();
        let view = view(&registry, 0, &errors, FormValues::new());
        let mut shell = shell("Concert\n1 Rue X\n750012\nParis\n");

        let action = shell.next_action(&view);
        let expected = FormValues::new()
            .with(fields::NAME, "Concert")
            .with(fields::ADDRESS, "1 Rue X")
            .with(fields::ZIP_CODE, "75001")
            .with(fields::CITY, "Paris");
        assert_eq!(action, ShellAction::Next(expected));

        let output = String::from_utf8(shell.into_output()).unwrap();
        assert!(output.contains("Nom de l'événement *"));
        assert!(output.contains("Code postal *"));
    }

    #[test]
    fn test_empty_answer_keeps_value() {
        let registry = event_steps();
        let errors = FieldErrors::new();
        let values = FormValues::new().with(fields::STARTING_DATE, "2024-06-01");
        let view = view(&registry, 1, &errors, values);
        let mut shell = shell("\n\n");

        assert_eq!(shell.next_action(&view), ShellAction::Next(FormValues::new()));
        let output = String::from_utf8(shell.into_output()).unwrap();
        assert!(output.contains("[2024-06-01]"));
        assert!(output.contains("Heure de fin (optionnel)"));
    }

    #[test]
    fn test_clear_sends_empty_value() {
        let registry = event_steps();
        let errors = FieldErrors::new();
        let values = FormValues::new()
            .with(fields::STARTING_DATE, "2024-06-01")
            .with(fields::ENDING_DATE, "2024-06-03");
        let view = view(&registry, 1, &errors, values);
        let mut shell = shell("\n:clear\n");

        assert_eq!(
            shell.next_action(&view),
            ShellAction::Next(FormValues::new().with(fields::ENDING_DATE, ""))
        );
    }

    #[test]
    fn test_commands() {
        let registry = event_steps();
        let errors = FieldErrors::new();
        let view = view(&registry, 1, &errors, FormValues::new());

        assert_eq!(shell(":back\n").next_action(&view), ShellAction::Back);
        assert_eq!(shell("2024-06-01\n:quit\n").next_action(&view), ShellAction::Quit);
        assert_eq!(shell("").next_action(&view), ShellAction::Quit);
    }

    #[test]
    fn test_image_is_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let registry = event_steps();
        let errors = FieldErrors::new();
        let view = view(&registry, 2, &errors, FormValues::new());
        let mut shell = shell(&format!("{}\n", path.display()));

        let ShellAction::Next(edits) = shell.next_action(&view) else {
            panic!("expected edits");
        };
        let asset = edits.get(fields::IMAGE).and_then(|v| v.as_file()).unwrap();
        assert_eq!(asset.name(), "poster.png");
        assert_eq!(asset.media_type(), "image/png");
        assert_eq!(asset.bytes(), &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_unreadable_image_stays_text() {
        let registry = event_steps();
        let errors = FieldErrors::new();
        let view = view(&registry, 2, &errors, FormValues::new());
        let mut shell = shell("/does/not/exist.png\n");

        let ShellAction::Next(edits) = shell.next_action(&view) else {
            panic!("expected edits");
        };
        assert_eq!(edits.text(fields::IMAGE), Some("/does/not/exist.png"));
        let output = String::from_utf8(shell.into_output()).unwrap();
        assert!(output.contains("Impossible de lire"));
    }

    #[test]
    fn test_render_shows_errors_and_progress() {
        let registry = event_steps();
        let engine = event_wizard_core::ValidationEngine::new(registry.clone());
        let errors = engine
            .validate(0, &FormValues::new())
            .unwrap_err()
            .field_errors()
            .cloned()
            .unwrap();
        let view = view(&registry, 0, &errors, FormValues::new());
        let mut shell = shell("");

        shell.render(&view);
        let output = String::from_utf8(shell.into_output()).unwrap();
        assert!(output.contains("Étape 1/5"));
        assert!(output.contains("Informations générales de l'événement"));
        assert!(output.contains("  ! Le nom de l'événement est requis"));
        assert!(!output.contains(":back"));
    }
}
