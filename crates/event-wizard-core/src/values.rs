use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A binary file picked by the user, with its declared media type
#[derive(Clone, PartialEq, Eq)]
pub struct FileAsset {
    name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl FileAsset {
    /// Create a new file asset
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// File name as declared by the picker
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type (e.g. `image/png`)
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Raw content
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are left out on purpose, they can be megabytes long.
impl fmt::Debug for FileAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAsset")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A single form value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text as typed by the user
    Text(String),
    /// A number, produced by numeric rules after normalization
    Number(f64),
    /// A binary file
    File(FileAsset),
}

impl FieldValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric content, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// File content, if this is a file
    pub fn as_file(&self) -> Option<&FileAsset> {
        match self {
            FieldValue::File(file) => Some(file),
            _ => None,
        }
    }

    /// Whether the value counts as "not filled in"
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::File(_) => false,
        }
    }

    /// JSON form of the value. Files have no JSON form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            FieldValue::Text(text) => Some(Value::String(text.clone())),
            FieldValue::Number(number) => serde_json::Number::from_f64(*number).map(Value::Number),
            FieldValue::File(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::File(file) => write!(f, "{} ({})", file.name(), file.media_type()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<f64> for FieldValue {
    fn from(number: f64) -> Self {
        FieldValue::Number(number)
    }
}

impl From<FileAsset> for FieldValue {
    fn from(file: FileAsset) -> Self {
        FieldValue::File(file)
    }
}

/// Field name to value mapping, ordered by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    /// Create an empty set of values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Remove a value
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    /// Look up a value
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Text value of a field
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Whether a field has a value
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Overlay `other` on top of these values; `other` wins on conflicts
    pub fn merge(&mut self, other: FormValues) {
        self.0.extend(other.0);
    }

    /// Iterate over `(field, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields with a value
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field has a value
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
