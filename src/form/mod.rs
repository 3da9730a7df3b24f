mod binding;
mod controller;
mod events;
pub mod schema;
mod submit;
mod validation;


pub use binding::{FieldHandler, FieldHandlers, SUBMIT_LABEL, SUBMITTING_LABEL};
pub use controller::{
    FieldMeta, FormController, FormError, FormOptions, FormResult, FormSnapshot, RevalidateMode,
    SubmissionStatus, SubmitOutcome, ValidationMode,
};
pub use events::{FormEvent, SubscriptionId};
pub use schema::{FieldErrors, FieldName, FormValues, Rule, SignupRecord};
pub use submit::{BoxedSubmitFuture, DelaySubmitter, SubmissionError, Submitter};
