//! Mapping from addressing errors to Problem (pure data)
//!
//! Baseline conversion to RFC 9457 Problem Details without HTTP framework
//! dependencies. The transport layer adds instance paths and trace ids
//! before the Problem becomes a response.

use odata_errors::{ErrDef, Problem};

use crate::error::Error;

const BAD_REQUEST: ErrDef = ErrDef {
    status: 400,
    title: "Bad Request",
    code: "odata.bad_request",
    type_url: "https://errors.odatakit.dev/odata.bad_request",
};

const NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "Not Found",
    code: "odata.not_found",
    type_url: "https://errors.odatakit.dev/odata.not_found",
};

const NOT_IMPLEMENTED: ErrDef = ErrDef {
    status: 501,
    title: "Not Implemented",
    code: "odata.not_implemented",
    type_url: "https://errors.odatakit.dev/odata.not_implemented",
};

const INTERNAL: ErrDef = ErrDef {
    status: 500,
    title: "Internal Server Error",
    code: "odata.internal",
    type_url: "https://errors.odatakit.dev/odata.internal",
};

impl From<Error> for Problem {
    fn from(err: Error) -> Self {
        let detail = err.to_string();
        match err {
            Error::Syntax { .. }
            | Error::TypeMismatch { .. }
            | Error::MissingKey
            | Error::NotAnAlternateKey(_)
            | Error::InvalidKeyValue { .. }
            | Error::UnknownAlias(_)
            | Error::OrderBySyntax(_)
            | Error::InvalidSortDirection(_)
            | Error::InvalidQueryOption { .. }
            | Error::UnsupportedComposition { .. } => BAD_REQUEST.as_problem(detail),

            Error::SegmentNotFound(_) | Error::KeyNotFound { .. } => {
                NOT_FOUND.as_problem(detail)
            }

            Error::NotImplemented(_) => NOT_IMPLEMENTED.as_problem(detail),

            // Registration faults and adapter failures are not the client's
            // fault; hide the specifics.
            Error::InvalidModel(_) | Error::Source(_) => {
                INTERNAL.as_problem("An internal error occurred while resolving the request")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PrimitiveKind;

    #[test]
    fn key_errors_map_to_400() {
        let p: Problem = Error::NotAnAlternateKey("Name".to_owned()).into();
        assert_eq!(p.status.as_u16(), 400);
        assert_eq!(p.code, "odata.bad_request");
        assert!(p.detail.contains("Name"));
    }

    #[test]
    fn parse_errors_carry_the_position_in_the_detail() {
        let p: Problem = Error::TypeMismatch {
            pos: 7,
            expected: PrimitiveKind::Int32,
        }
        .into();
        assert_eq!(p.status.as_u16(), 400);
        assert!(p.detail.contains("position 7"));
        assert!(p.detail.contains("Edm.Int32"));
    }

    #[test]
    fn missing_entities_map_to_404() {
        let p: Problem = Error::KeyNotFound {
            set: "Widgets".to_owned(),
            key: "Id=5".to_owned(),
        }
        .into();
        assert_eq!(p.status.as_u16(), 404);
        assert_eq!(p.code, "odata.not_found");
    }

    #[test]
    fn unresolved_segments_map_to_404() {
        let p: Problem = Error::SegmentNotFound("Gadgets".to_owned()).into();
        assert_eq!(p.status.as_u16(), 404);
        assert!(p.detail.contains("Gadgets"));
    }

    #[test]
    fn unsupported_options_map_to_501() {
        let p: Problem = Error::NotImplemented("$search").into();
        assert_eq!(p.status.as_u16(), 501);
        assert!(p.detail.contains("$search"));
    }

    #[test]
    fn internal_faults_hide_specifics() {
        let p: Problem = Error::Source("connection refused to 10.0.0.1".to_owned()).into();
        assert_eq!(p.status.as_u16(), 500);
        assert!(!p.detail.contains("10.0.0.1"));
    }
}
