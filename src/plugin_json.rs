use actix_web::{
    HttpRequest, HttpResponse, Responder,
    body::BoxBody,
    http::header::{CONTENT_TYPE, HeaderValue},
};
use serde::Serialize;

/// JSON response body of the plugin routes.
/// Actix's `Json` answers a serialization failure with the error text; the
/// plugin routes never put error details in a body, so this one answers
/// with an empty 500 and logs instead.
#[derive(Debug)]
pub struct PluginJson<T>(pub T)
where
    T: Serialize;
impl<T> Responder for PluginJson<T>
where
    T: Serialize,
{
    type Body = BoxBody;

    fn respond_to(self, _: &HttpRequest) -> HttpResponse<Self::Body> {
        match serde_json::to_string(&self.0) {
            Ok(body) => HttpResponse::Ok()
                .insert_header((CONTENT_TYPE, HeaderValue::from_static("application/json")))
                .body(body),
            Err(err) => {
                log::error!("Failed to encode response: {err}");
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}
