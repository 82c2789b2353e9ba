use crate::models::Category;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{category} data unavailable for {year}: {reason}")]
    DataUnavailable {
        category: Category,
        year: i32,
        reason: String,
    },

    #[error("{category} data unavailable: no partition could be loaded")]
    NoPartitions { category: Category },

    #[error("{category} partition {year} has columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        category: Category,
        year: i32,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{category} row {row}: cannot parse reference date '{value}'")]
    DateParse {
        category: Category,
        row: usize,
        value: String,
    },

    #[error("{category} table has no column '{column}'")]
    MissingColumn { category: Category, column: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    /// True when the category could not be assembled from its source files.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            PipelineError::DataUnavailable { .. } | PipelineError::NoPartitions { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
