//! ForUs partner integration
//!
//! ForUs sends learners to the platform with a set of profile and enrollment
//! fields signed by a shared secret. [`signing`] defines the wire contract,
//! [`validator`] decides whether a request is accepted, and this module turns
//! rejections into the message and URL of the partner error page.

pub mod signing;
pub mod validator;

pub use signing::{canonical_message, sign, sign_request, verify_signature, SignedRequest};
pub use validator::{CleanFields, ForUsValidator};

use url::form_urlencoded;

use crate::Error;

/// Join messages into a single sentence: `"a. b."`
pub fn error_message<S: AsRef<str>>(messages: &[S]) -> String {
    let joined = messages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(". ");
    format!("{}.", joined)
}

/// URL of the error page carrying the joined messages as `message`
pub fn error_redirect_url<S: AsRef<str>>(base_url: &str, messages: &[S]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("message", &error_message(messages))
        .finish();
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query)
}

/// Every user-facing message carried by an error, in field order
pub fn error_messages(err: &Error) -> Vec<String> {
    err.field_messages()
        .messages()
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrors;

    #[test]
    fn test_error_message_joins_sentences() {
        assert_eq!(
            error_message(&["Invalid gender has been provided", "Request has expired"]),
            "Invalid gender has been provided. Request has expired."
        );
        assert_eq!(error_message(&["Only one"]), "Only one.");
    }

    #[test]
    fn test_error_redirect_url_encodes_message() {
        let url = error_redirect_url("/forus/v1/error/", &["Request has expired"]);
        assert_eq!(url, "/forus/v1/error/?message=Request+has+expired.");
    }

    #[test]
    fn test_error_redirect_url_existing_query() {
        let url = error_redirect_url("https://edraak.org/forus?lang=ar", &["a&b"]);
        assert_eq!(url, "https://edraak.org/forus?lang=ar&message=a%26b.");
    }

    #[test]
    fn test_error_redirect_url_non_ascii() {
        let url = error_redirect_url("/e", &["خطأ"]);
        assert_eq!(url, "/e?message=%D8%AE%D8%B7%D8%A3.");
    }

    #[test]
    fn test_error_messages_from_validation_error() {
        let mut errors = FieldErrors::new();
        errors.add("time", "Request has expired");
        errors.add("gender", "Invalid gender has been provided");
        let messages = error_messages(&Error::ValidationError(errors));
        assert_eq!(
            messages,
            vec!["Invalid gender has been provided", "Request has expired"]
        );
    }
}
