//! Shared response envelope types for API handlers.
//!
//! Successful responses use a `{ "result": "success", "data": ... }`
//! envelope. Plain acknowledgements carry `"data": null`. Errors are built in
//! [`crate::error`] with `"result": "error"`.

use serde::Serialize;

/// Value of the `result` field on every successful response.
pub const RESULT_SUCCESS: &str = "success";

/// Standard `{ "result": "success", "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse::new(stats)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub result: &'static str,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            result: RESULT_SUCCESS,
            data,
        }
    }
}

impl DataResponse<()> {
    /// Empty acknowledgement.
    pub fn ack() -> Self {
        Self::new(())
    }
}
