use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// JSON body extractor that rejects malformed input with a 400 naming the
/// offending JSON path, before the gate or any query runs.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::bad_request(format!("failed to read body: {err}")))?;

        let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
        match serde_path_to_error::deserialize::<_, T>(deserializer) {
            Ok(value) => Ok(ValidJson(value)),
            Err(err) => {
                let path = err.path().to_string();
                Err(AppError::bad_request(format!(
                    "invalid request body at {}: {}",
                    path,
                    err.inner()
                )))
            }
        }
    }
}
