use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Banner {
    pub id: i32,
    pub title_fr: Option<String>,
    pub title_ar: Option<String>,
    pub subtitle_fr: Option<String>,
    pub subtitle_ar: Option<String>,
    pub image: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Text fields of the multipart banner form.
#[derive(Debug, Default)]
pub struct BannerForm {
    pub title_fr: Option<String>,
    pub title_ar: Option<String>,
    pub subtitle_fr: Option<String>,
    pub subtitle_ar: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BannerData {
    pub title_fr: Option<String>,
    pub title_ar: Option<String>,
    pub subtitle_fr: Option<String>,
    pub subtitle_ar: Option<String>,
    pub image: String,
    pub active: bool,
}

impl BannerForm {
    /// Form checkboxes arrive as `"true"`/`"on"`; anything else is false.
    pub fn parse_active(value: &str) -> bool {
        matches!(value.trim(), "true" | "1" | "on")
    }

    pub fn into_data(self, image: String) -> BannerData {
        BannerData {
            title_fr: self.title_fr,
            title_ar: self.title_ar,
            subtitle_fr: self.subtitle_fr,
            subtitle_ar: self.subtitle_ar,
            image,
            active: self.active.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checkbox_values() {
        assert!(BannerForm::parse_active("true"));
        assert!(BannerForm::parse_active(" on "));
        assert!(!BannerForm::parse_active("false"));
        assert!(!BannerForm::parse_active(""));
    }

    #[test]
    fn missing_active_flag_means_inactive() {
        let data = BannerForm::default().into_data("/uploads/b.png".to_string());
        assert!(!data.active);
        assert_eq!(data.image, "/uploads/b.png");
    }
}
