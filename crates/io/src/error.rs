use std::path::PathBuf;

use thiserror::Error;

/// An extract could not be turned into text.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open workbook {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("workbook {} has no sheet named '{sheet}'", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("workbook {} has no sheets", path.display())]
    EmptyWorkbook { path: PathBuf },
}

/// The report workbook could not be built or written.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("workbook build failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
