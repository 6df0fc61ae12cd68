//! Request-side normalization.

use serde_json::{Map, Value};

use crate::error::{RelayError, RelayResult};

/// Method whose boolean positional parameters are coerced to integers.
pub const COERCED_BOOL_METHOD: &str = "getrawtransaction";

/// Decode a request body, apply method-specific rewrites, re-encode.
///
/// Surrounding whitespace is trimmed before decoding. For
/// [`COERCED_BOOL_METHOD`] every boolean in `params` becomes `1` or `0` in
/// place; everything else is passed through untouched.
pub fn normalize_request(body: &[u8]) -> RelayResult<Vec<u8>> {
    let mut request: Map<String, Value> = serde_json::from_slice(body.trim_ascii())?;

    if request.get("method").and_then(Value::as_str) == Some(COERCED_BOOL_METHOD) {
        let params = request
            .get_mut("params")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                RelayError::InvalidInput("params is missing or not an array".to_string())
            })?;
        coerce_bools(params);
    }

    Ok(serde_json::to_vec(&request)?)
}

fn coerce_bools(params: &mut [Value]) {
    for param in params.iter_mut() {
        if let Value::Bool(flag) = *param {
            *param = Value::from(u8::from(flag));
        }
    }
}
