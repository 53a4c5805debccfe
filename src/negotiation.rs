use crate::{MEDIATYPE, error::PluginError};
use actix_web::{HttpResponse, http::header as actix_header};
use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, VARY},
};

/// Value of the `Vary` header on the negotiation route.
const VARY_VALUE: &str = "Content-Type";

/// What both sides expect to see on the negotiation route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationDescriptor {
    pub media_type: String,
    pub vary_header_value: String,
}
impl NegotiationDescriptor {
    pub fn current() -> Self {
        NegotiationDescriptor {
            media_type: MEDIATYPE.to_string(),
            vary_header_value: VARY_VALUE.to_string(),
        }
    }

    /// Check a negotiation response.
    /// Header values are compared as plain strings, the way ExternalDNS does.
    pub fn verify(&self, status: StatusCode, headers: &HeaderMap) -> Result<(), PluginError> {
        if status != StatusCode::OK {
            return Err(PluginError::Protocol {
                subject: "status",
                expected: StatusCode::OK.to_string(),
                actual: Some(status.to_string()),
            });
        }
        check_header(headers, &VARY, "Vary", &self.vary_header_value)?;
        check_header(headers, &CONTENT_TYPE, "Content-Type", &self.media_type)
    }
}

fn check_header(
    headers: &HeaderMap,
    name: &HeaderName,
    subject: &'static str,
    expected: &str,
) -> Result<(), PluginError> {
    let actual = headers.get(name).and_then(|v| v.to_str().ok());
    if actual == Some(expected) {
        Ok(())
    } else {
        Err(PluginError::Protocol {
            subject,
            expected: expected.to_string(),
            actual: actual.map(str::to_string),
        })
    }
}

/// Ask the server at `base` which protocol it speaks.
pub(crate) async fn handshake(client: &Client, base: &Url) -> Result<(), PluginError> {
    let res = client
        .get(base.clone())
        .header(ACCEPT, MEDIATYPE)
        .send()
        .await
        .map_err(|source| PluginError::Handshake {
            url: base.to_string(),
            source,
        })?;
    NegotiationDescriptor::current().verify(res.status(), res.headers())
}

/// Server side of the handshake. Answers any method and any body.
pub(crate) async fn negotiate() -> HttpResponse {
    let descriptor = NegotiationDescriptor::current();
    HttpResponse::Ok()
        .insert_header((actix_header::VARY, descriptor.vary_header_value))
        .insert_header((actix_header::CONTENT_TYPE, descriptor.media_type))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(vary: &'static str, content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static(vary));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn accepts_exact_headers() {
        let d = NegotiationDescriptor::current();
        assert_eq!(d.vary_header_value, "Content-Type");
        let ok = d.verify(StatusCode::OK, &headers("Content-Type", MEDIATYPE));
        assert!(ok.is_ok());
    }

    #[test]
    fn rejects_other_versions() {
        let d = NegotiationDescriptor::current();
        let err = d
            .verify(
                StatusCode::OK,
                &headers("Content-Type", "application/external.dns.plugin+json;version=2"),
            )
            .unwrap_err();
        assert!(matches!(err, PluginError::Protocol { subject: "Content-Type", .. }));

        // Re-formatted parameters are a mismatch too.
        let err = d
            .verify(
                StatusCode::OK,
                &headers("Content-Type", "application/external.dns.plugin+json; version=1"),
            )
            .unwrap_err();
        assert!(matches!(err, PluginError::Protocol { .. }));
    }

    #[test]
    fn rejects_missing_vary_and_bad_status() {
        let d = NegotiationDescriptor::current();
        let mut h = headers("Content-Type", MEDIATYPE);
        h.remove(VARY);
        let err = d.verify(StatusCode::OK, &h).unwrap_err();
        assert!(matches!(err, PluginError::Protocol { subject: "Vary", actual: None, .. }));

        let err = d
            .verify(StatusCode::NOT_FOUND, &headers("Content-Type", MEDIATYPE))
            .unwrap_err();
        assert!(matches!(err, PluginError::Protocol { subject: "status", .. }));
    }
}
