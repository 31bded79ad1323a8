use axum::{
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Query, RawPathParams, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    auth::{Identity, TOKEN_HEADER, TokenCodec, authenticate, authorize},
    binder::{BindError, OperationParams, bind},
    error::ApiError,
    operations,
};

/// Authorized
///
/// The request pipeline of every protected operation, expressed as one extractor.
/// Stages run strictly in this order and the first failure short-circuits:
///
/// 1. authenticate the `Token` header (401)
/// 2. bind path and query parameters against the operation's table entry (400)
/// 3. authorize the identity's role against the operation's capability (403)
///
/// Because it is a `FromRequestParts` extractor, axum runs it before any body
/// extractor, so the JSON body is only read once all three stages have passed.
#[derive(Debug)]
pub struct Authorized<P> {
    pub identity: Identity,
    pub params: P,
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
    P: OperationParams + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let spec = operations::spec(P::OPERATION);
        let codec = TokenCodec::from_ref(state);

        let identity = authenticate(parts.headers.get(TOKEN_HEADER), &codec)?;

        let path_params = if spec.path_params.is_empty() {
            None
        } else {
            Some(
                RawPathParams::from_request_parts(parts, state)
                    .await
                    .map_err(|rejection| BindError::InvalidParamFormat {
                        name: "path",
                        cause: rejection.body_text(),
                    })?,
            )
        };
        let path: Vec<(&str, &str)> = path_params
            .as_ref()
            .map(|raw| raw.iter().collect())
            .unwrap_or_default();

        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|rejection| BindError::MalformedQuery(rejection.body_text()))?;

        let bound = bind(spec, &path, &query)?;
        let params = P::from_bound(&bound)?;

        authorize(&identity, spec.capability)?;

        tracing::debug!(operation = %spec, username = %identity.username, "request admitted");
        Ok(Authorized { identity, params })
    }
}

/// ValidatedJson
///
/// Reads the whole body, decodes it as JSON and runs its `Validate` rules. Any
/// failure, including an empty body or a missing content type, is a 422.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BodyValidation(rejection.body_text()))?;

        let value: T = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::BodyValidation(err.to_string()))?;
        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
