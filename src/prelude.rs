pub use crate::form::{
    DelaySubmitter, FieldErrors, FieldName, FormController, FormError, FormEvent, FormOptions,
    FormResult, FormValues, RevalidateMode, SignupRecord, SubmissionError, SubmissionStatus,
    SubmitOutcome, Submitter, ValidationMode,
};
