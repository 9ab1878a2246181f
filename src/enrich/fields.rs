//! Profile field groups read from a loaded profile or company page

use crate::extractors::profile::owned;
use crate::leads::{LeadRecord, normalize_phone};
use crate::utils::{clean_display_name, collapse_whitespace};

/// A `LeadRecord` field the enricher can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Picture,
    Name,
    Caption,
    Job,
    Company,
    Location,
    Info,
    Email,
    Phone,
    Website,
}

impl ProfileField {
    /// Whether the record already carries a non-empty value
    #[must_use]
    pub fn is_filled(self, record: &LeadRecord) -> bool {
        let value = match self {
            Self::Name => Some(record.name.as_str()),
            Self::Picture => record.picture.as_deref(),
            Self::Caption => record.caption.as_deref(),
            Self::Job => record.job.as_deref(),
            Self::Company => record.company.as_deref(),
            Self::Location => record.location.as_deref(),
            Self::Info => record.info.as_deref(),
            Self::Email => record.email.as_deref(),
            Self::Phone => record.phone.as_deref(),
            Self::Website => record.website.as_deref(),
        };
        value.is_some_and(|v| !v.trim().is_empty())
    }

    /// Clean `raw` for this field and store it; returns whether anything was set
    pub fn fill(self, record: &mut LeadRecord, raw: &str) -> bool {
        let Some(value) = self.clean(raw) else {
            return false;
        };
        match self {
            Self::Name => record.name = value,
            Self::Picture => record.picture = Some(value),
            Self::Caption => record.caption = Some(value),
            Self::Job => record.job = Some(value),
            Self::Company => record.company = Some(value),
            Self::Location => record.location = Some(value),
            Self::Info => record.info = Some(value),
            Self::Email => record.email = Some(value),
            Self::Phone => record.phone = Some(value),
            Self::Website => record.website = Some(value),
        }
        true
    }

    fn clean(self, raw: &str) -> Option<String> {
        let value = match self {
            Self::Name => clean_display_name(raw),
            Self::Email => raw.trim().trim_start_matches("mailto:").to_string(),
            Self::Phone => normalize_phone(raw)?,
            Self::Picture | Self::Website => raw.trim().to_string(),
            _ => collapse_whitespace(raw),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Selectors for one field, tried together within one bounded wait
#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub field: ProfileField,
    pub selectors: Vec<String>,
    pub attr: Option<&'static str>,
}

impl FieldGroup {
    fn text(field: ProfileField, selectors: &[&str]) -> Self {
        Self {
            field,
            selectors: owned(selectors),
            attr: None,
        }
    }

    fn attr(field: ProfileField, selectors: &[&str], attr: &'static str) -> Self {
        Self {
            field,
            selectors: owned(selectors),
            attr: Some(attr),
        }
    }
}

/// Top-card groups of a person or company page
#[must_use]
pub fn profile_groups() -> Vec<FieldGroup> {
    vec![
        FieldGroup::attr(
            ProfileField::Picture,
            &[
                r#"img[class*="profile-picture"]"#,
                "img.pv-top-card-profile-picture__image",
                "img.org-top-card-primary-content__logo",
            ],
            "src",
        ),
        FieldGroup::text(
            ProfileField::Name,
            &[".mt2.relative h1", "h1.text-heading-xlarge", "h1.org-top-card-summary__title"],
        ),
        FieldGroup::text(
            ProfileField::Caption,
            &[".text-body-medium.break-words", ".org-top-card-summary-info-list"],
        ),
        FieldGroup::text(
            ProfileField::Job,
            &["div.ph5.pb5 > div.mt2.relative > div:nth-child(1) > div.text-body-medium.break-words"],
        ),
        FieldGroup::text(
            ProfileField::Company,
            &[
                "ul > li:nth-child(1) > button > span > div",
                r#"button[aria-label^="Current company"] span"#,
            ],
        ),
        FieldGroup::text(
            ProfileField::Location,
            &[".text-body-small.inline.t-black--light.break-words"],
        ),
        FieldGroup::text(
            ProfileField::Info,
            &["div.display-flex.ph5.pv3 > div > div > div", "section.artdeco-card div.inline-show-more-text"],
        ),
    ]
}

/// Opener of the contact-info dialog
#[must_use]
pub fn contact_opener() -> Vec<String> {
    owned(&[r#"a[href*="contact-info"]"#, "#top-card-text-details-contact-info"])
}

/// Groups read from the open contact-info dialog
#[must_use]
pub fn contact_groups() -> Vec<FieldGroup> {
    vec![
        FieldGroup::attr(ProfileField::Email, &[r#"[role="dialog"] a[href^="mailto:"]"#], "href"),
        FieldGroup::text(ProfileField::Phone, &[r#"[role="dialog"] li > span.t-14.t-black.t-normal"#]),
        FieldGroup::attr(
            ProfileField::Website,
            &[r#"[role="dialog"] a[href^="http"]:not([href*="linkedin.com"])"#],
            "href",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::{LeadKind, Platform};

    #[test]
    fn fills_only_cleaned_values() {
        let mut r = LeadRecord::new("", Platform::LinkedIn, LeadKind::Comment, "s");
        assert!(!ProfileField::Name.is_filled(&r));
        assert!(ProfileField::Email.fill(&mut r, "mailto:jane@acme.io"));
        assert_eq!(r.email.as_deref(), Some("jane@acme.io"));
        assert!(!ProfileField::Phone.fill(&mut r, "call me"));
        assert!(ProfileField::Phone.fill(&mut r, "+33 6 12 34 56 78"));
        assert_eq!(r.phone.as_deref(), Some("+33612345678"));
        assert!(ProfileField::Location.fill(&mut r, "  Paris,\n  France "));
        assert_eq!(r.location.as_deref(), Some("Paris, France"));
    }
}
