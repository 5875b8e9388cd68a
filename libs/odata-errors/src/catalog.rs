//! Static error-catalog entries
//!
//! Protocol error kinds are declared once as `const` definitions and turned
//! into [`Problem`]s with an occurrence-specific detail message at the point
//! of failure.

use crate::problem::Problem;
use http::StatusCode;

/// Static definition of one catalogued error kind.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this definition into a Problem carrying the given detail.
    #[inline]
    pub fn as_problem(&self, detail: impl Into<String>) -> Problem {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Problem::new(status, self.title, detail.into())
            .with_code(self.code)
            .with_type(self.type_url)
    }
}
