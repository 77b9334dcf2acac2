/// Label of the pseudo-entry that routes free text as the model id.
pub const CUSTOM_MODEL_LABEL: &str = "Custom Hugging Face Model ID";

/// One selectable model as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: String,
    pub display_name: String,
}

impl ModelEntry {
    /// Returns `None` when either field is blank.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Option<Self> {
        let id = id.into().trim().to_string();
        let display_name = display_name.into().trim().to_string();
        if id.is_empty() || display_name.is_empty() {
            return None;
        }
        Some(Self { id, display_name })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    Catalog(String),
    Custom,
}

/// Catalog entries plus the user's current pick.
///
/// The custom pseudo-entry is never stored in `entries`; it is appended when
/// options are listed and always available, even without a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelSelection {
    entries: Vec<ModelEntry>,
    choice: Option<ModelChoice>,
    custom_input: String,
}

impl ModelSelection {
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn choice(&self) -> Option<&ModelChoice> {
        self.choice.as_ref()
    }

    /// Replaces the catalog. Defaults to the first entry unless the user
    /// already picked something that is still valid.
    pub(crate) fn set_entries(&mut self, entries: Vec<ModelEntry>) {
        self.entries = entries;
        let still_valid = match &self.choice {
            Some(ModelChoice::Custom) => true,
            Some(ModelChoice::Catalog(id)) => self.contains(id),
            None => false,
        };
        if !still_valid {
            self.choice = self
                .entries
                .first()
                .map(|entry| ModelChoice::Catalog(entry.id.clone()));
        }
    }

    /// Returns false when a catalog id is not part of the catalog.
    pub(crate) fn choose(&mut self, choice: ModelChoice) -> bool {
        if let ModelChoice::Catalog(id) = &choice {
            if !self.contains(id) {
                return false;
            }
        }
        self.choice = Some(choice);
        true
    }

    pub(crate) fn set_custom_input(&mut self, input: String) {
        self.custom_input = input;
    }

    /// Picks the catalog entry named by `input`, or routes it as custom text.
    pub(crate) fn request(&mut self, input: &str) {
        let input = input.trim();
        if self.contains(input) {
            self.choice = Some(ModelChoice::Catalog(input.to_string()));
        } else {
            self.custom_input = input.to_string();
            self.choice = Some(ModelChoice::Custom);
        }
    }

    /// The model id a submission would use right now.
    pub fn effective_model_id(&self) -> Option<&str> {
        match self.choice.as_ref()? {
            ModelChoice::Catalog(id) => Some(id.as_str()),
            ModelChoice::Custom => {
                let custom = self.custom_input.trim();
                (!custom.is_empty()).then_some(custom)
            }
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }
}
