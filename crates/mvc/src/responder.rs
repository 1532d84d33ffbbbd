//! Conversion of action results into HTTP responses.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! can be converted into HTTP responses, with implementations for the common
//! return types of actions (strings, pre-built responses, status tuples, [`Html`]).

use crate::body::ResponseBody;
use http::{HeaderValue, Response, StatusCode};
use std::convert::Infallible;

/// A trait for types that can be converted into HTTP responses.
pub trait Responder {
    fn into_response(self) -> Response<ResponseBody>;
}

/// Marks its content as `text/html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Html<T>(pub T);

fn text_response(body: ResponseBody, content_type: &mime::Mime) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(http::header::CONTENT_TYPE, value);
    }
    response
}

impl<T: Into<ResponseBody>> Responder for Html<T> {
    fn into_response(self) -> Response<ResponseBody> {
        text_response(self.0.into(), &mime::TEXT_HTML_UTF_8)
    }
}

/// The Ok and Err variants must both implement Responder.
impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// None returns an empty response.
impl<T: Responder> Responder for Option<T> {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Some(t) => t.into_response(),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn into_response(self) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn into_response(self) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.into_response();
        *response.status_mut() = status;
        response
    }
}

impl<T: Responder> Responder for Box<T> {
    fn into_response(self) -> Response<ResponseBody> {
        (*self).into_response()
    }
}

impl Responder for () {
    fn into_response(self) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response<ResponseBody> {
        text_response(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for String {
    fn into_response(self) -> Response<ResponseBody> {
        text_response(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for Infallible {
    fn into_response(self) -> Response<ResponseBody> {
        match self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_sets_content_type() {
        let response = Html("<p>hi</p>".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[test]
    fn status_tuple_overrides_status() {
        let response = (StatusCode::NOT_FOUND, "not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn none_is_empty() {
        let response = Option::<String>::None.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().is_empty());
    }
}
