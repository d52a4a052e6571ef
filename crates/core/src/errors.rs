use thiserror::Error;

/// Failure reported by a catalog collaborator. Never retried or suppressed here.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog data unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SelectionError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Catalog(CatalogError::Unavailable(_)) => "data_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{CatalogError, SelectionError};

    #[test]
    fn catalog_failure_converts_into_selection_error() {
        let error: SelectionError = CatalogError::Unavailable("database is locked".to_owned()).into();

        assert_eq!(error.error_class(), "data_unavailable");
        assert_eq!(error.to_string(), "catalog data unavailable: database is locked");
    }
}
