//! Domain DTOs for the link API.
//!
//! # Design
//! `GenerateLinkRequest` uses `Option` for every field so "not set" is
//! distinguishable from a zero or `false` value. Strings are only sent when
//! they are non-empty; numbers and flags are sent whenever they are set.
//!
//! Response types are lenient: every field is optional and unknown fields are
//! ignored, so additions on the server side never break decoding.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Parameters for creating a short link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateLinkRequest {
    pub url: Option<String>,
    pub alias: Option<String>,
    pub password: Option<String>,
    pub disable: Option<bool>,
    pub public: Option<bool>,
    pub description: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub expiration_time: Option<NaiveTime>,
    pub expiration_clicks: Option<u64>,
    pub domain: Option<u64>,
    pub expiration_url: Option<String>,
}

impl GenerateLinkRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Form fields for the create call, in wire order, skipping unset values.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut form = Vec::new();

        push_text(&mut form, "url", &self.url);
        push_text(&mut form, "alias", &self.alias);
        push_text(&mut form, "password", &self.password);
        if let Some(disable) = self.disable {
            form.push(("disable", flag(disable)));
        }
        if let Some(public) = self.public {
            form.push(("public", flag(public)));
        }
        push_text(&mut form, "description", &self.description);
        if let Some(date) = self.expiration_date {
            form.push(("expiration_date", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(time) = self.expiration_time {
            form.push(("expiration_time", time.format(TIME_FORMAT).to_string()));
        }
        if let Some(clicks) = self.expiration_clicks {
            form.push(("expiration_clicks", clicks.to_string()));
        }
        if let Some(domain) = self.domain {
            form.push(("domain", domain.to_string()));
        }
        push_text(&mut form, "expiration_url", &self.expiration_url);

        form
    }
}

fn push_text(form: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        form.push((key, value.to_string()));
    }
}

fn flag(value: bool) -> String {
    u8::from(value).to_string()
}

/// A short link as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub id: Option<u64>,
    pub alias: Option<String>,
    pub url: Option<String>,
    pub short_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub clicks: Option<u64>,
    pub disabled: Option<u8>,
    pub public: Option<u8>,
    pub password_protected: Option<bool>,
    pub expiration_date: Option<String>,
    pub expiration_time: Option<String>,
    pub expiration_clicks: Option<u64>,
    pub expiration_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Decoded success payload shared by every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseModel {
    pub data: Option<Link>,
    pub message: Option<String>,
    pub status: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(form: &[(&'static str, String)]) -> Vec<&'static str> {
        form.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn url_only_yields_single_field() {
        let form = GenerateLinkRequest::new("https://example.com").form_fields();
        assert_eq!(form, vec![("url", "https://example.com".to_string())]);
    }

    #[test]
    fn empty_request_yields_no_fields() {
        assert!(GenerateLinkRequest::default().form_fields().is_empty());
    }

    #[test]
    fn empty_strings_are_skipped() {
        let request = GenerateLinkRequest {
            url: Some("https://example.com".to_string()),
            alias: Some(String::new()),
            description: Some(String::new()),
            ..GenerateLinkRequest::default()
        };
        assert_eq!(keys(&request.form_fields()), vec!["url"]);
    }

    #[test]
    fn explicit_zero_and_false_are_sent() {
        let request = GenerateLinkRequest {
            disable: Some(false),
            expiration_clicks: Some(0),
            domain: Some(0),
            ..GenerateLinkRequest::default()
        };
        assert_eq!(
            request.form_fields(),
            vec![
                ("disable", "0".to_string()),
                ("expiration_clicks", "0".to_string()),
                ("domain", "0".to_string()),
            ]
        );
    }

    #[test]
    fn all_fields_are_stringified_in_order() {
        let request = GenerateLinkRequest {
            url: Some("https://example.com/long".to_string()),
            alias: Some("promo".to_string()),
            password: Some("hunter2".to_string()),
            disable: Some(true),
            public: Some(true),
            description: Some("Spring campaign".to_string()),
            expiration_date: NaiveDate::from_ymd_opt(2026, 12, 31),
            expiration_time: NaiveTime::from_hms_opt(23, 59, 0),
            expiration_clicks: Some(100),
            domain: Some(7),
            expiration_url: Some("https://example.com/expired".to_string()),
        };

        let form = request.form_fields();
        assert_eq!(
            keys(&form),
            vec![
                "url",
                "alias",
                "password",
                "disable",
                "public",
                "description",
                "expiration_date",
                "expiration_time",
                "expiration_clicks",
                "domain",
                "expiration_url",
            ]
        );
        let value = |key: &str| form.iter().find(|(k, _)| *k == key).unwrap().1.clone();
        assert_eq!(value("disable"), "1");
        assert_eq!(value("public"), "1");
        assert_eq!(value("expiration_date"), "2026-12-31");
        assert_eq!(value("expiration_time"), "23:59");
        assert_eq!(value("expiration_clicks"), "100");
        assert_eq!(value("domain"), "7");
    }

    #[test]
    fn response_model_ignores_unknown_fields() {
        let model: ResponseModel = serde_json::from_str(
            r#"{"data":{"id":42,"alias":"abc123","url":"https://example.com","clicks":3,"owner":{"id":1}},"status":200}"#,
        )
        .unwrap();
        let link = model.data.unwrap();
        assert_eq!(link.id, Some(42));
        assert_eq!(link.alias.as_deref(), Some("abc123"));
        assert_eq!(link.clicks, Some(3));
        assert_eq!(model.status, Some(200));
    }

    #[test]
    fn response_model_accepts_empty_object() {
        let model: ResponseModel = serde_json::from_str("{}").unwrap();
        assert_eq!(model, ResponseModel::default());
    }
}
