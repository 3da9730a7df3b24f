use std::collections::BTreeMap;
use std::sync::Arc;

use super::controller::{FormController, FormResult, SubmissionStatus};
use super::schema::FieldName;

pub const SUBMIT_LABEL: &str = "Submit";
pub const SUBMITTING_LABEL: &str = "Submitting...";

pub type FieldHandler = Arc<dyn Fn(String) -> FormResult<()> + Send + Sync>;

/// Change handlers keyed by field, built once per controller.
#[derive(Clone)]
pub struct FieldHandlers {
    handlers: BTreeMap<FieldName, FieldHandler>,
}

impl FieldHandlers {
    pub fn get(&self, field: FieldName) -> Option<&FieldHandler> {
        self.handlers.get(&field)
    }

    pub fn dispatch(&self, field: FieldName, value: impl Into<String>) -> FormResult<()> {
        match self.handlers.get(&field) {
            Some(handler) => handler(value.into()),
            None => Ok(()),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.handlers.keys().copied()
    }
}

impl FormController {
    pub fn field_handlers(&self) -> FieldHandlers {
        let handlers = FieldName::ALL
            .into_iter()
            .map(|field| {
                let controller = self.clone();
                let handler: FieldHandler =
                    Arc::new(move |value: String| controller.set_field(field, value));
                (field, handler)
            })
            .collect();
        FieldHandlers { handlers }
    }

    /// The single inline message shown under a field.
    pub fn field_error_for_display(&self, field: FieldName) -> FormResult<Option<String>> {
        Ok(self.errors()?.first(field).map(str::to_owned))
    }

    pub fn inputs_disabled(&self) -> FormResult<bool> {
        Ok(self.status()? == SubmissionStatus::Submitting)
    }

    pub fn submit_label(&self) -> FormResult<&'static str> {
        Ok(if self.inputs_disabled()? {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        })
    }
}
