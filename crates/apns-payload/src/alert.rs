//! The `alert` dictionary.

use serde::{Deserialize, Serialize};

use crate::encode::{FastEncode, ObjectWriter};
use crate::errors::EncodeError;

/// Localizable alert content. Empty fields are omitted; none are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Alert {
    /// Notification title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Secondary line under the title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    /// Main message text.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    /// Launch image shown when the app opens from the notification.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub launch_image: String,
    /// Localization key for the action button title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub action_loc_key: String,
    /// Localization key for the body.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub loc_key: String,
    /// Format arguments for `loc-key`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loc_args: Vec<String>,
    /// Localization key for the title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title_loc_key: String,
    /// Format arguments for `title-loc-key`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub title_loc_args: Vec<String>,
    /// Localization key for the subtitle.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subtitle_loc_key: String,
    /// Format arguments for `subtitle-loc-key`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtitle_loc_args: Vec<String>,
}

impl Alert {
    /// Alert with a title and body.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}

impl FastEncode for Alert {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let mut obj = ObjectWriter::begin(out);
        obj.str("title", &self.title);
        obj.str("subtitle", &self.subtitle);
        obj.str("body", &self.body);
        obj.str("launch-image", &self.launch_image);
        obj.str("action-loc-key", &self.action_loc_key);
        obj.str("loc-key", &self.loc_key);
        obj.str_list("loc-args", &self.loc_args);
        obj.str("title-loc-key", &self.title_loc_key);
        obj.str_list("title-loc-args", &self.title_loc_args);
        obj.str("subtitle-loc-key", &self.subtitle_loc_key);
        obj.str_list("subtitle-loc-args", &self.subtitle_loc_args);
        obj.end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(alert: &Alert) -> String {
        let mut out = Vec::new();
        alert.encode_into(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn full() -> Alert {
        Alert {
            title: "Game Request".into(),
            subtitle: "Five Card Draw".into(),
            body: "Bob wants to play poker".into(),
            launch_image: "launch.png".into(),
            action_loc_key: "PLAY".into(),
            loc_key: "GAME_PLAY_REQUEST_FORMAT".into(),
            loc_args: vec!["Jenna".into(), "Frank".into()],
            title_loc_key: "GAME_TITLE".into(),
            title_loc_args: vec!["poker".into()],
            subtitle_loc_key: "GAME_SUBTITLE".into(),
            subtitle_loc_args: vec!["draw".into(), "five".into()],
        }
    }

    #[test]
    fn empty_alert_is_empty_object() {
        assert_eq!(fast(&Alert::default()), "{}");
    }

    #[test]
    fn title_and_body() {
        assert_eq!(fast(&Alert::new("Hello", "World")), r#"{"title":"Hello","body":"World"}"#);
    }

    #[test]
    fn all_fields_match_serde_byte_for_byte() {
        let alert = full();
        assert_eq!(fast(&alert), serde_json::to_string(&alert).unwrap());
    }

    #[test]
    fn wire_names_are_hyphenated() {
        let json: serde_json::Value = serde_json::from_str(&fast(&full())).unwrap();
        for key in [
            "launch-image",
            "action-loc-key",
            "loc-key",
            "loc-args",
            "title-loc-key",
            "title-loc-args",
            "subtitle-loc-key",
            "subtitle-loc-args",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["loc-args"], serde_json::json!(["Jenna", "Frank"]));
    }

    #[test]
    fn escapes_text() {
        let alert = Alert::new("say \"hi\"", "line1\nline2");
        let parsed: Alert = serde_json::from_str(&fast(&alert)).unwrap();
        assert_eq!(parsed, alert);
    }
}
