//! Status code predicates over [`Response`].

use http::StatusCode;

use super::Predicate;
use crate::response::Response;

/// Passes `2xx` responses. The default success predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessStatus;

impl Predicate for SuccessStatus {
    type Subject = Response;

    fn check(&self, response: &Response) -> bool {
        response.status.is_success()
    }
}

/// Passes `5xx` responses. The default retry predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerError;

impl Predicate for ServerError {
    type Subject = Response;

    fn check(&self, response: &Response) -> bool {
        response.status.is_server_error()
    }
}

/// Passes responses whose status is in a fixed set.
#[derive(Debug, Clone, Default)]
pub struct StatusCodes {
    codes: Vec<StatusCode>,
}

impl StatusCodes {
    /// Creates a predicate matching any of `codes`.
    pub fn new(codes: impl IntoIterator<Item = StatusCode>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }
}

impl Predicate for StatusCodes {
    type Subject = Response;

    fn check(&self, response: &Response) -> bool {
        self.codes.contains(&response.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::PredicateExt;
    use crate::request::RequestConfig;

    fn response(status: u16) -> Response {
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            RequestConfig::get("/"),
        )
    }

    #[test]
    fn test_success_status() {
        assert!(SuccessStatus.check(&response(200)));
        assert!(SuccessStatus.check(&response(204)));
        assert!(!SuccessStatus.check(&response(304)));
        assert!(!SuccessStatus.check(&response(500)));
    }

    #[test]
    fn test_server_error() {
        assert!(ServerError.check(&response(503)));
        assert!(!ServerError.check(&response(404)));
    }

    #[test]
    fn test_status_codes_composed_with_business_check() {
        // Some gateways answer 200 with an error code in the body.
        let ok_body = crate::predicate::from_fn(|response: &Response| {
            response
                .json::<serde_json::Value>()
                .map(|body| body["code"] == 0)
                .unwrap_or(false)
        });
        let success = SuccessStatus.and(ok_body);

        let good = response(200).with_data(r#"{"code":0}"#);
        let bad = response(200).with_data(r#"{"code":401}"#);
        assert!(success.check(&good));
        assert!(!success.check(&bad));
        assert!(StatusCodes::new([StatusCode::CONFLICT]).check(&response(409)));
    }
}
