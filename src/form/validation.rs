use super::controller::{
    FormController, FormResult, RevalidateMode, SubmissionStatus, ValidationMode,
    read_lock, transition_submit_state, write_lock,
};
use super::events::FormEvent;
use super::schema::{self, FieldErrors, FieldName};

impl FormController {
    /// Overwrites a field value and applies the configured trigger policy.
    ///
    /// A settled submission (`Succeeded` or `Failed`) drops back to `Idle`.
    /// While `Submitting` the value is still accepted; gating input is the
    /// view's job (see [`FormController::inputs_disabled`]).
    pub fn set_field(&self, field: FieldName, value: impl Into<String>) -> FormResult<()> {
        let value = value.into();
        let mut events = vec![FormEvent::FieldChanged(field)];
        {
            let mut state = write_lock(&self.state, "writing field value")?;
            let dirty = !value.is_empty();
            state.values.set(field, value);
            let failed_once = {
                let meta = state.ensure_meta(field);
                meta.dirty = dirty;
                meta.failed_once
            };

            if matches!(
                state.status,
                SubmissionStatus::Succeeded | SubmissionStatus::Failed
            ) {
                events.extend(transition_submit_state(&mut state, SubmissionStatus::Idle)?);
            }

            if self.should_validate_on_change(failed_once) {
                let messages = self.compute_field_errors(field, state.values.get(field));
                tracing::debug!(%field, violations = messages.len(), "field revalidated");
                state.store_field_errors(field, messages);
                events.push(FormEvent::Validated {
                    valid: state.errors.is_empty(),
                });
            }
        }
        self.emit(&events)
    }

    /// Recomputes one field's errors. Returns whether the field is valid.
    pub fn validate_field(&self, field: FieldName) -> FormResult<bool> {
        let (field_valid, form_valid) = {
            let mut state = write_lock(&self.state, "writing field validation result")?;
            let messages = self.compute_field_errors(field, state.values.get(field));
            let field_valid = messages.is_empty();
            state.store_field_errors(field, messages);
            (field_valid, state.errors.is_empty())
        };
        self.emit(&[FormEvent::Validated { valid: form_valid }])?;
        Ok(field_valid)
    }

    /// Runs a full validation pass without submitting.
    pub fn validate_form(&self) -> FormResult<bool> {
        let valid = {
            let mut state = write_lock(&self.state, "applying form validation result")?;
            let errors = self.shape_errors(schema::validate(&state.values));
            state.store_errors(&errors);
            errors.is_empty()
        };
        tracing::debug!(valid, "form validated");
        self.emit(&[FormEvent::Validated { valid }])?;
        Ok(valid)
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading form validity")?
            .errors
            .is_empty())
    }

    pub(super) fn shape_errors(&self, mut errors: FieldErrors) -> FieldErrors {
        if self.options.first_error_only {
            errors.truncate_to_first();
        }
        errors
    }

    fn compute_field_errors(&self, field: FieldName, value: &str) -> Vec<&'static str> {
        let mut messages = schema::validate_field(field, value);
        if self.options.first_error_only {
            messages.truncate(1);
        }
        messages
    }

    fn should_validate_on_change(&self, failed_once: bool) -> bool {
        if self.options.validate_mode == ValidationMode::OnChange {
            return true;
        }
        failed_once && self.options.revalidate_mode == RevalidateMode::OnChange
    }
}
