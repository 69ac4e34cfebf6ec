//! Content service over a host-supplied transport
//!
//! Requests are percent-encoded form bodies. The conversion kinds go to a single service
//! endpoint selected by a `service` parameter; images go to their own endpoint, which answers
//! with an image URL that may contain an `@BASE@` marker for the endpoint's base path.

use super::{ContentService, Payload, RenderKind, RenderParams};
use crate::codec::build_query;
use crate::error::ServiceError;
use crate::metrics::PNG_SIGNATURE;
use log::debug;
use url::Url;

pub const BASE_MARKER: &str = "@BASE@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub service: Url,
    pub create_image: Url,
}

impl ServiceEndpoints {
    pub fn new(service: &str, create_image: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            service: Url::parse(service)?,
            create_image: Url::parse(create_image)?,
        })
    }

    /// Endpoints relative to one base URL, e.g. `https://host/integration/` + `service`.
    pub fn from_base(base: &str, service_path: &str, image_path: &str) -> Result<Self, ServiceError> {
        let base = Url::parse(base)?;
        Ok(Self {
            service: base.join(service_path)?,
            create_image: base.join(image_path)?,
        })
    }

    /// The image endpoint without its last path segment and query.
    pub fn image_base(&self) -> String {
        let mut base = self.create_image.clone();
        base.set_query(None);
        base.set_fragment(None);
        if let Ok(mut segments) = base.path_segments_mut() {
            segments.pop();
        }
        base.as_str().trim_end_matches('/').to_string()
    }
}

/// A request ready to be sent by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub url: Url,
    pub content_type: &'static str,
    pub body: String,
}

/// Delivers requests for [`RemoteContentService`]. Supplied by the integration, which owns
/// the HTTP stack.
pub trait Transport: Send + Sync {
    fn post(&self, request: &ServiceRequest) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Debug)]
pub struct RemoteContentService<T> {
    endpoints: ServiceEndpoints,
    transport: T,
}

impl<T: Transport> RemoteContentService<T> {
    pub fn new(endpoints: ServiceEndpoints, transport: T) -> Self {
        Self {
            endpoints,
            transport,
        }
    }

    pub fn request(&self, kind: RenderKind, params: &RenderParams) -> ServiceRequest {
        let (url, body) = match kind.service_name() {
            Some(service) => (
                self.endpoints.service.clone(),
                build_query(params.iter().chain([("service", service)])),
            ),
            None => (self.endpoints.create_image.clone(), build_query(params.iter())),
        };
        ServiceRequest {
            url,
            content_type: "application/x-www-form-urlencoded; charset=utf-8",
            body,
        }
    }
}

impl<T: Transport> ContentService for RemoteContentService<T> {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError> {
        let request = self.request(kind, params);
        debug!("{} request to {}", kind, request.url);
        let body = self.transport.post(&request)?;
        if body.is_empty() {
            return Err(ServiceError::Empty { kind });
        }
        let payload = match kind {
            RenderKind::MarkupToImage if body.starts_with(&PNG_SIGNATURE) => Payload::Binary(body),
            RenderKind::MarkupToImage => Payload::Text(
                String::from_utf8_lossy(&body).replace(BASE_MARKER, &self.endpoints.image_base()),
            ),
            _ => Payload::Text(String::from_utf8_lossy(&body).into_owned()),
        };
        Ok(payload)
    }
}
