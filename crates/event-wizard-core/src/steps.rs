//! Step definitions and the step registry.
//!
//! The registry is an ordered, immutable table. The event wizard's table is
//! built once on first use and shared behind an `Arc`.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{WizardError, WizardResult};
use crate::schema::{FieldRule, FieldSchema};

/// Field names used by the event wizard
pub mod fields {
    /// Event name
    pub const NAME: &str = "name";
    /// Street address
    pub const ADDRESS: &str = "address";
    /// Five digit postal code
    pub const ZIP_CODE: &str = "zipCode";
    /// City
    pub const CITY: &str = "city";
    /// Start date
    pub const STARTING_DATE: &str = "startingDate";
    /// Optional end date
    pub const ENDING_DATE: &str = "endingDate";
    /// Poster image
    pub const IMAGE: &str = "image";
    /// Ticket price
    pub const PRICE: &str = "price";
    /// Free-text description
    pub const DESCRIPTION: &str = "description";
    /// Optional website link
    pub const WEBSITE: &str = "website";
}

/// Kind of input a shell should render for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// Single line text
    Text,
    /// Date (and time) picker
    Date,
    /// Image picker
    Image,
    /// Multi-line text
    TextArea,
}

/// Typed description of one input widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWidget {
    /// Field the widget edits
    pub field: &'static str,
    /// Label shown next to the input
    pub label: &'static str,
    /// Widget kind
    pub kind: WidgetKind,
    /// Columns taken in a grid layout
    pub span: Option<u8>,
    /// Placeholder text
    pub placeholder: Option<&'static str>,
    /// Maximum input length
    pub max_length: Option<usize>,
    /// Name of a trailing icon (e.g. a currency sign)
    pub end_icon: Option<&'static str>,
}

impl FieldWidget {
    /// Create a widget of the given kind
    pub fn new(field: &'static str, label: &'static str, kind: WidgetKind) -> Self {
        Self {
            field,
            label,
            kind,
            span: None,
            placeholder: None,
            max_length: None,
            end_icon: None,
        }
    }

    /// Single line text widget
    pub fn text(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label, WidgetKind::Text)
    }

    /// Date widget
    pub fn date(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label, WidgetKind::Date)
    }

    /// Image picker widget
    pub fn image(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label, WidgetKind::Image)
    }

    /// Multi-line text widget
    pub fn text_area(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label, WidgetKind::TextArea)
    }

    /// Set the grid span
    pub fn span(mut self, span: u8) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the placeholder
    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Set the maximum input length
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the trailing icon
    pub fn end_icon(mut self, icon: &'static str) -> Self {
        self.end_icon = Some(icon);
        self
    }
}

/// How a step's widgets are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepLayout {
    /// Grid with the given number of columns
    Grid {
        /// Column count
        columns: u8,
    },
    /// Widgets side by side
    Row,
    /// Widgets stacked
    Column,
}

/// Rendering contract for a step, consumed by the presentation shell only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContract {
    /// Arrangement hint
    pub layout: StepLayout,
    /// Widgets in display order
    pub widgets: Vec<FieldWidget>,
}

/// One page of the wizard
#[derive(Debug, Clone)]
pub struct StepDefinition {
    /// Display title
    pub title: &'static str,
    /// Display subtitle
    pub subtitle: &'static str,
    /// Fields owned by the step, with their rules
    pub fields: Vec<FieldSchema>,
    /// How to render the step's inputs
    pub render: RenderContract,
}

impl StepDefinition {
    /// Create an empty step laid out as a column
    pub fn new(title: &'static str, subtitle: &'static str) -> Self {
        Self {
            title,
            subtitle,
            fields: Vec::new(),
            render: RenderContract {
                layout: StepLayout::Column,
                widgets: Vec::new(),
            },
        }
    }

    /// Add a field rule
    pub fn field(mut self, name: &'static str, rule: FieldRule) -> Self {
        self.fields.push(FieldSchema::new(name, rule));
        self
    }

    /// Set the layout
    pub fn layout(mut self, layout: StepLayout) -> Self {
        self.render.layout = layout;
        self
    }

    /// Add a widget
    pub fn widget(mut self, widget: FieldWidget) -> Self {
        self.render.widgets.push(widget);
        self
    }

    /// Look up a field schema by name
    pub fn schema(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this step owns the field
    pub fn owns(&self, name: &str) -> bool {
        self.schema(name).is_some()
    }
}

/// Ordered, immutable list of steps
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
}

impl StepRegistry {
    /// Build a registry, checking its invariants:
    /// at least one step, every field owned by exactly one step, and every
    /// widget bound to a field of its own step.
    pub fn new(steps: Vec<StepDefinition>) -> WizardResult<Self> {
        if steps.is_empty() {
            return Err(WizardError::InvalidRegistry(
                "a wizard needs at least one step".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            for field in &step.fields {
                if !seen.insert(field.name) {
                    return Err(WizardError::InvalidRegistry(format!(
                        "field '{}' in step {} is already owned by another step",
                        field.name, index
                    )));
                }
            }
            for widget in &step.render.widgets {
                if !step.owns(widget.field) {
                    return Err(WizardError::InvalidRegistry(format!(
                        "widget '{}' in step {} has no matching field",
                        widget.field, index
                    )));
                }
            }
        }

        Ok(Self { steps })
    }

    /// Build a registry from a table known to be valid
    pub(crate) fn new_unchecked(steps: Vec<StepDefinition>) -> Self {
        Self { steps }
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a registry has at least one step
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the terminal step
    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Step at `index`
    pub fn get(&self, index: usize) -> WizardResult<&StepDefinition> {
        self.steps.get(index).ok_or(WizardError::UnknownStep {
            index,
            count: self.steps.len(),
        })
    }

    /// All steps in order
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Index of the step owning `field`
    pub fn step_of(&self, field: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.owns(field))
    }

    /// Name of the field holding the asset to upload
    pub fn asset_field(&self) -> Option<&'static str> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.rule.expects_file())
            .map(|f| f.name)
    }
}

static EVENT_STEPS: Lazy<Arc<StepRegistry>> =
    Lazy::new(|| Arc::new(StepRegistry::new_unchecked(event_step_definitions())));

/// The five steps of the event creation wizard
pub fn event_steps() -> Arc<StepRegistry> {
    EVENT_STEPS.clone()
}

fn event_step_definitions() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(
            "Informations générales de l'événement",
            "Veuillez renseignez les informations ci-dessous",
        )
        .field(
            fields::NAME,
            FieldRule::RequiredText {
                message: "Le nom de l'événement est requis",
            },
        )
        .field(
            fields::ADDRESS,
            FieldRule::RequiredText {
                message: "L'adresse de l'événement est requis",
            },
        )
        .field(
            fields::ZIP_CODE,
            FieldRule::PostalCode {
                message: "Le code postal est requis",
            },
        )
        .field(
            fields::CITY,
            FieldRule::RequiredText {
                message: "La ville est requise",
            },
        )
        .layout(StepLayout::Grid { columns: 4 })
        .widget(FieldWidget::text(fields::NAME, "Nom de l'événement *").span(4))
        .widget(FieldWidget::text(fields::ADDRESS, "Adresse *").span(4))
        .widget(
            FieldWidget::text(fields::ZIP_CODE, "Code postal *")
                .span(2)
                .max_length(5),
        )
        .widget(FieldWidget::text(fields::CITY, "Ville *").span(2)),
        StepDefinition::new(
            "Dates de l'événement",
            "Choisir les dates et heures de début et de fin de l'événement",
        )
        .field(
            fields::STARTING_DATE,
            FieldRule::RequiredText {
                message: "Une date de début est requise",
            },
        )
        .field(fields::ENDING_DATE, FieldRule::OptionalText)
        .layout(StepLayout::Row)
        .widget(FieldWidget::date(fields::STARTING_DATE, "Début *").span(2))
        .widget(
            FieldWidget::date(fields::ENDING_DATE, "Fin")
                .span(2)
                .placeholder("Heure de fin (optionnel)"),
        ),
        StepDefinition::new("Affiche de l'événement", "Choisir un visuel *")
            .field(
                fields::IMAGE,
                FieldRule::image(
                    "Un visuel est requis",
                    "L'image n'est pas valide",
                    "Le fichier sélectionné n'est pas une image",
                ),
            )
            .widget(FieldWidget::image(fields::IMAGE, "Visuel")),
        StepDefinition::new(
            "Tarif de l'événement",
            "Veuillez renseigner un tarif, 0 si l'événement est gratuit",
        )
        .field(
            fields::PRICE,
            FieldRule::Decimal {
                min: 0.0,
                type_message: "Un tarif est obligatoire, mettre 0 si gratuit",
                min_message: "Le tarif doit être positif",
            },
        )
        .layout(StepLayout::Row)
        .widget(
            FieldWidget::text(fields::PRICE, "Tarif *")
                .span(2)
                .end_icon("euro"),
        ),
        StepDefinition::new(
            "Description et lien url",
            "Veullez fournir une brève description et un lien url d'un site",
        )
        .field(
            fields::DESCRIPTION,
            FieldRule::RequiredText {
                message: "Une description est requise",
            },
        )
        .field(fields::WEBSITE, FieldRule::OptionalText)
        .widget(FieldWidget::text_area(fields::DESCRIPTION, "Description *"))
        .widget(
            FieldWidget::text(fields::WEBSITE, "Lien url de l'événement (optionnel)").span(2),
        ),
    ]
}
