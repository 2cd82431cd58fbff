use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    /// Placement exhausted the zone's possible tiles. The top-level driver
    /// may retry generation with a different seed.
    #[error("not enough space in zone {zone}: {detail} (map seed {seed})")]
    LackOfSpace { zone: u32, seed: u32, detail: String },

    #[error("invalid template: {0}")]
    TemplateInvalid(String),

    #[error("missing catalog entry: {0}")]
    CatalogMissing(String),

    /// Invariant violation; always a programming or data error, never
    /// retried.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GenError>;
