#![deny(missing_docs)]

//! # Actix Web Adapter
//!
//! Converts actix requests and responses into their generic forms, renders
//! [`GuardError`] as an HTTP error, and provides [`ContractValidation`], a
//! middleware running a [`ContractGuard`] around the wrapped service.

use crate::error::{
    GuardError, GuardResult, ParamLocation, ParamViolation, RequestViolations, ViolationKind,
};
use crate::guard::ContractGuard;
use crate::http::{GenericRequest, GenericResponse, UploadedFile};
use crate::response::media_type;
use actix_multipart::{Multipart, MultipartError};
use actix_web::body::{to_bytes, BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::{ErrorInternalServerError, PayloadError};
use actix_web::http::header::{HeaderMap, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use futures_util::{stream, TryStreamExt};
use serde_json::json;
use std::collections::BTreeMap;
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Builds a generic request from an actix request and its buffered body.
///
/// Url-encoded bodies become form fields. Multipart parts carrying a file name
/// become uploaded files, the other parts form fields. Any other non-empty body
/// is kept as text.
///
/// # Errors
///
/// `Request` with a `formData` decode violation when a multipart body is malformed.
pub async fn generic_request(req: &HttpRequest, body: &Bytes) -> GuardResult<GenericRequest> {
    let mut generic = GenericRequest::new(req.path()).with_query_string(req.query_string());

    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            generic = generic.with_header(name.as_str(), value);
        }
    }

    match media_type(header_str(req.headers(), CONTENT_TYPE.as_str())).as_str() {
        FORM_URLENCODED => Ok(generic.with_form_urlencoded(body)),
        MULTIPART_FORM_DATA => read_multipart(generic, req.headers(), body.clone()).await,
        _ if !body.is_empty() => Ok(generic.with_body(String::from_utf8_lossy(body).into_owned())),
        _ => Ok(generic),
    }
}

async fn read_multipart(
    mut generic: GenericRequest,
    headers: &HeaderMap,
    body: Bytes,
) -> GuardResult<GenericRequest> {
    let mut multipart = Multipart::new(headers, stream::once(ready(Ok::<_, PayloadError>(body))));

    while let Some(mut field) = multipart.try_next().await.map_err(multipart_error)? {
        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        let Some(name) = disposition.get_name().map(str::to_string) else {
            continue;
        };
        let file_name = disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            data.extend_from_slice(&chunk);
        }

        generic = match file_name {
            Some(file_name) => generic.with_file(
                name,
                UploadedFile {
                    file_name: Some(file_name),
                    content_type,
                    data,
                },
            ),
            None => generic.with_form(name, String::from_utf8_lossy(&data).into_owned()),
        };
    }

    Ok(generic)
}

fn multipart_error(e: MultipartError) -> GuardError {
    GuardError::Request(RequestViolations(vec![ParamViolation::new(
        "multipart",
        ParamLocation::FormData,
        ViolationKind::Decode,
        e.to_string(),
    )]))
}

/// Builds a generic response from a status, headers and buffered body.
pub fn generic_response(status: StatusCode, headers: &HeaderMap, body: &Bytes) -> GenericResponse {
    let collected: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    GenericResponse::new(
        status.as_u16(),
        String::from_utf8_lossy(body).into_owned(),
        header_str(headers, CONTENT_TYPE.as_str()),
        collected,
    )
}

fn body_error<E>(e: E) -> String
where
    E: Into<Box<dyn std::error::Error>>,
{
    e.into().to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

impl ResponseError for GuardError {
    fn status_code(&self) -> StatusCode {
        if self.is_request_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let violations: Vec<_> = match self {
            GuardError::Request(violations) => violations
                .iter()
                .map(|v| {
                    json!({
                        "name": v.name,
                        "in": v.location.as_str(),
                        "kind": v.kind.as_str(),
                        "message": v.message,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
            "violations": violations,
        }))
    }
}

/// Middleware factory validating traffic of the wrapped service against one operation.
///
/// ```ignore
/// web::resource("/subjects")
///     .wrap(ContractValidation::new(guard))
///     .route(web::get().to(list_subjects))
/// ```
#[derive(Debug, Clone)]
pub struct ContractValidation {
    guard: Arc<ContractGuard>,
}

impl ContractValidation {
    /// Wraps `guard`.
    pub fn new(guard: ContractGuard) -> Self {
        Self {
            guard: Arc::new(guard),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ContractValidation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type Transform = ContractValidationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ContractValidationMiddleware {
            service: Rc::new(service),
            guard: Arc::clone(&self.guard),
        }))
    }
}

/// Service produced by [`ContractValidation`].
pub struct ContractValidationMiddleware<S> {
    service: Rc<S>,
    guard: Arc<ContractGuard>,
}

impl<S, B> Service<ServiceRequest> for ContractValidationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let guard = Arc::clone(&self.guard);

        Box::pin(async move {
            if guard.checks_requests() {
                let body = req.extract::<Bytes>().await?;
                let generic = match generic_request(req.request(), &body).await {
                    Ok(generic) => generic,
                    Err(e) => return Ok(req.error_response(e)),
                };
                if let Err(e) = guard.check_request(&generic) {
                    return Ok(req.error_response(e));
                }

                // The extractor drained the stream; hand the buffered bytes back to the handler.
                let (_, mut payload) = actix_http::h1::Payload::create(true);
                payload.unread_data(body);
                req.set_payload(payload.into());
            }

            let res = service.call(req).await?;
            if !guard.checks_responses() {
                return Ok(res.map_into_boxed_body());
            }

            let (http_req, http_res) = res.into_parts();
            let (head, body) = http_res.into_parts();
            let body = to_bytes(body)
                .await
                .map_err(|e| ErrorInternalServerError(body_error(e)))?;

            let generic = generic_response(head.status(), head.headers(), &body);
            if let Err(e) = guard.check_response(&generic) {
                return Ok(ServiceResponse::new(http_req, e.error_response()));
            }

            Ok(ServiceResponse::new(http_req, head.set_body(BoxBody::new(body))))
        })
    }
}
