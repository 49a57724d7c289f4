use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid model: {0}")]
    Invalid(String),

    #[error("invalid resource quantity for '{resource}': {value}")]
    InvalidQuantity { resource: &'static str, value: String },

    #[error("invalid job template: {0}")]
    Template(String),

    #[error("container '{0}' not found in job template")]
    MissingContainer(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
