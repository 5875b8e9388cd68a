//! Protocol error data types for ODataKit
//!
//! Pure data, no HTTP framework dependencies:
//! - RFC 9457 Problem Details (`Problem`)
//! - Static error-catalog entries (`ErrDef`)

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem};

/// Attach the request instance path and optional trace id to a Problem.
///
/// Convenience for the transport layer, which knows the request URI and
/// trace context while the core libraries only know the error itself.
pub fn finalize(mut p: Problem, instance: &str, trace_id: Option<String>) -> Problem {
    p = p.with_instance(instance);
    if let Some(tid) = trace_id {
        p = p.with_trace_id(tid);
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn finalize_attaches_instance_and_trace_id() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "malformed key");
        let p = finalize(p, "/Widgets(abc)", Some("req-42".to_owned()));
        assert_eq!(p.instance, "/Widgets(abc)");
        assert_eq!(p.trace_id, Some("req-42".to_owned()));
    }

    #[test]
    fn finalize_leaves_a_missing_trace_id_unset() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not Found", "no such entity");
        let p = finalize(p, "/Widgets(9)", None);
        assert_eq!(p.instance, "/Widgets(9)");
        assert_eq!(p.trace_id, None);
    }
}
