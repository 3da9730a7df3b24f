use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use super::events::{FormEvent, Listeners};
use super::schema::{FieldErrors, FieldName, FormValues, SignupRecord, validate_record};
use super::submit::{SubmissionError, Submitter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    OnChange,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevalidateMode {
    OnChange,
    OnSubmit,
}

/// `validate_mode` governs fields that have never failed; `revalidate_mode`
/// takes over for a field once it has produced an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub revalidate_mode: RevalidateMode,
    pub first_error_only: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::OnSubmit,
            revalidate_mode: RevalidateMode::OnChange,
            first_error_only: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FieldMeta {
    pub dirty: bool,
    pub failed_once: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FormSnapshot {
    pub values: FormValues,
    pub errors: FieldErrors,
    pub field_meta: BTreeMap<FieldName, FieldMeta>,
    pub status: SubmissionStatus,
    pub submit_count: u32,
    pub is_dirty: bool,
    pub is_valid: bool,
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submission status transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
}

pub type FormResult<T> = Result<T, FormError>;

/// Result of one `submit` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// The submitter accepted the record; the form has been cleared.
    Submitted(SignupRecord),
    /// Validation failed; the submitter was not called.
    Rejected(FieldErrors),
    /// The submitter rejected the record; values are kept for a retry.
    Failed(SubmissionError),
    /// Another submission is still in flight.
    AlreadySubmitting,
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

pub(super) struct FormState {
    pub(super) values: FormValues,
    pub(super) errors: FieldErrors,
    pub(super) field_meta: BTreeMap<FieldName, FieldMeta>,
    pub(super) status: SubmissionStatus,
    pub(super) submit_count: u32,
    pub(super) generation: u64,
}

impl FormState {
    pub(super) fn new() -> Self {
        Self {
            values: FormValues::new(),
            errors: FieldErrors::new(),
            field_meta: BTreeMap::new(),
            status: SubmissionStatus::Idle,
            submit_count: 0,
            generation: 0,
        }
    }

    pub(super) fn ensure_meta(&mut self, field: FieldName) -> &mut FieldMeta {
        self.field_meta.entry(field).or_default()
    }

    pub(super) fn store_field_errors(&mut self, field: FieldName, messages: Vec<&'static str>) {
        if !messages.is_empty() {
            self.ensure_meta(field).failed_once = true;
        }
        self.errors.replace(field, messages);
    }

    pub(super) fn store_errors(&mut self, errors: &FieldErrors) {
        for field in FieldName::ALL {
            self.store_field_errors(field, errors.get(field).to_vec());
        }
    }

    fn clear(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.field_meta.clear();
    }
}

enum Prepared {
    Rejected(FieldErrors),
    Ready { record: SignupRecord, generation: u64 },
}

/// Owns the form state. Clones share the same state, submitter and listeners.
#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) submitter: Arc<dyn Submitter>,
    pub(super) listeners: Arc<RwLock<Listeners>>,
}

impl FormController {
    pub fn new(options: FormOptions, submitter: impl Submitter) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(FormState::new())),
            submitter: Arc::new(submitter),
            listeners: Arc::new(RwLock::new(Listeners::default())),
        }
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    /// Validates, then hands the record to the submitter.
    ///
    /// The only suspension point is the submitter's future. A `reset` that
    /// lands while it is pending makes the completion stale: the outcome is
    /// still returned, but the reset state is left alone.
    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        let mut events = Vec::new();
        let prepared = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.status == SubmissionStatus::Submitting {
                tracing::debug!("submit ignored while a submission is in flight");
                return Ok(SubmitOutcome::AlreadySubmitting);
            }
            state.submit_count = state.submit_count.saturating_add(1);

            let validated = validate_record(&state.values);
            match validated {
                Ok(record) => {
                    state.store_errors(&FieldErrors::new());
                    events.push(FormEvent::Validated { valid: true });
                    events.extend(transition_submit_state(
                        &mut state,
                        SubmissionStatus::Submitting,
                    )?);
                    Prepared::Ready {
                        record,
                        generation: state.generation,
                    }
                }
                Err(errors) => {
                    let errors = self.shape_errors(errors);
                    tracing::debug!(fields = errors.len(), "submit rejected by validation");
                    state.store_errors(&errors);
                    events.push(FormEvent::Validated { valid: false });
                    events.extend(transition_submit_state(&mut state, SubmissionStatus::Failed)?);
                    Prepared::Rejected(errors)
                }
            }
        };
        self.emit(&events)?;

        let (record, generation) = match prepared {
            Prepared::Rejected(errors) => return Ok(SubmitOutcome::Rejected(errors)),
            Prepared::Ready { record, generation } => (record, generation),
        };

        let result = self.submitter.submit(record.clone()).await;

        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "completing submit")?;
            if state.generation != generation {
                tracing::debug!("submission settled after reset; state left untouched");
            } else {
                match &result {
                    Ok(()) => {
                        state.clear();
                        state.submit_count = 0;
                        events.extend(transition_submit_state(
                            &mut state,
                            SubmissionStatus::Succeeded,
                        )?);
                    }
                    Err(error) => {
                        tracing::warn!(%error, "submission rejected");
                        events.extend(transition_submit_state(
                            &mut state,
                            SubmissionStatus::Failed,
                        )?);
                    }
                }
            }
        }
        self.emit(&events)?;

        Ok(match result {
            Ok(()) => SubmitOutcome::Submitted(record),
            Err(error) => SubmitOutcome::Failed(error),
        })
    }

    pub fn reset(&self) -> FormResult<()> {
        let mut events = vec![FormEvent::Reset];
        {
            let mut state = write_lock(&self.state, "resetting form")?;
            state.clear();
            state.submit_count = 0;
            state.generation = state.generation.wrapping_add(1);
            events.extend(transition_submit_state(&mut state, SubmissionStatus::Idle)?);
        }
        self.emit(&events)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            field_meta: state.field_meta.clone(),
            status: state.status,
            submit_count: state.submit_count,
            is_dirty: state.field_meta.values().any(|meta| meta.dirty),
            is_valid: state.errors.is_empty(),
        })
    }

    pub fn values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn errors(&self) -> FormResult<FieldErrors> {
        Ok(read_lock(&self.state, "reading field errors")?.errors.clone())
    }

    pub fn status(&self) -> FormResult<SubmissionStatus> {
        Ok(read_lock(&self.state, "reading submission status")?.status)
    }

    pub fn field_meta(&self, field: FieldName) -> FormResult<FieldMeta> {
        Ok(read_lock(&self.state, "reading field meta")?
            .field_meta
            .get(&field)
            .copied()
            .unwrap_or_default())
    }
}

/// Applies `next` if the lifecycle allows it and returns the change event.
pub(super) fn transition_submit_state(
    state: &mut FormState,
    next: SubmissionStatus,
) -> FormResult<Option<FormEvent>> {
    let current = state.status;
    if current == next {
        return Ok(None);
    }

    let allowed = matches!(
        (current, next),
        (
            SubmissionStatus::Idle | SubmissionStatus::Succeeded | SubmissionStatus::Failed,
            SubmissionStatus::Submitting | SubmissionStatus::Failed
        ) | (
            SubmissionStatus::Submitting,
            SubmissionStatus::Succeeded | SubmissionStatus::Failed
        ) | (_, SubmissionStatus::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    tracing::debug!(from = ?current, to = ?next, "submission status changed");
    state.status = next;
    Ok(Some(FormEvent::StatusChanged {
        from: current,
        to: next,
    }))
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
