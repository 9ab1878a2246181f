//! Lead record data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{IdentityKey, normalize_name, normalize_phone};
use crate::utils::{LINKEDIN_BASE_URL, WHATSAPP_BASE_URL, normalize_profile_url};

/// Site a lead was harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "LINKEDIN")]
    LinkedIn,
    #[serde(rename = "WHATSAPP")]
    WhatsApp,
}

impl Platform {
    /// Origin that relative links on this platform resolve against
    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            Self::LinkedIn => LINKEDIN_BASE_URL,
            Self::WhatsApp => WHATSAPP_BASE_URL,
        }
    }

    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::LinkedIn => "LINKEDIN",
            Self::WhatsApp => "WHATSAPP",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Self::LinkedIn),
            "whatsapp" => Ok(Self::WhatsApp),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// How the lead relates to the scraped page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    Comment,
    Reaction,
    Connection,
    Follower,
    SearchPerson,
    GroupMembership,
}

impl LeadKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Reaction => "reaction",
            Self::Connection => "connection",
            Self::Follower => "follower",
            Self::SearchPerson => "search_person",
            Self::GroupMembership => "group_membership",
        }
    }

    /// Uppercased category sent as the ingestion `type`
    #[must_use]
    pub fn wire_type(self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// Kinds that require the periodic human-pacing cooldown
    #[must_use]
    pub fn needs_cooldown(self) -> bool {
        matches!(
            self,
            Self::Reaction | Self::Connection | Self::Follower | Self::SearchPerson
        )
    }
}

impl std::fmt::Display for LeadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "comment" | "comments" => Ok(Self::Comment),
            "reaction" | "reactions" => Ok(Self::Reaction),
            "connection" | "connections" => Ok(Self::Connection),
            "follower" | "followers" => Ok(Self::Follower),
            "search_person" | "search" => Ok(Self::SearchPerson),
            "group_membership" | "group" | "members" => Ok(Self::GroupMembership),
            other => Err(format!("unknown lead kind '{other}'")),
        }
    }
}

/// One harvested person or contact point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Comment body for comment leads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub source_link: String,
    pub platform: Platform,
    #[serde(rename = "type")]
    pub kind: LeadKind,
    pub timestamp: DateTime<Utc>,
}

impl LeadRecord {
    /// Bare record with only the required fields set
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        platform: Platform,
        kind: LeadKind,
        source_link: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            profile_link: None,
            phone: None,
            picture: None,
            caption: None,
            company: None,
            job: None,
            email: None,
            location: None,
            website: None,
            info: None,
            text: None,
            reaction_type: None,
            group_name: None,
            source_link: source_link.into(),
            platform,
            kind,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_profile_link(mut self, link: impl Into<String>) -> Self {
        self.profile_link = Some(link.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Identity used for dedup: phone, else profile URL, else name
    #[must_use]
    pub fn identity_key(&self) -> Option<IdentityKey> {
        if let Some(phone) = self.phone.as_deref().and_then(normalize_phone) {
            return Some(IdentityKey::Phone(phone));
        }
        if let Some(url) = self
            .profile_link
            .as_deref()
            .and_then(|href| normalize_profile_url(self.platform.base_url(), href))
        {
            return Some(IdentityKey::Profile(url));
        }
        normalize_name(&self.name).map(IdentityKey::Name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_wire_shape() {
        let record = LeadRecord::new("Jane Doe", Platform::LinkedIn, LeadKind::SearchPerson, "https://x")
            .with_profile_link("https://www.linkedin.com/in/jane");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["platform"], "LINKEDIN");
        assert_eq!(json["type"], "search_person");
        assert_eq!(json["profileLink"], "https://www.linkedin.com/in/jane");
        assert_eq!(json["sourceLink"], "https://x");
        assert!(json.get("phone").is_none());
        assert_eq!(LeadKind::SearchPerson.wire_type(), "SEARCH_PERSON");
    }

    #[test]
    fn identity_prefers_phone_then_profile_then_name() {
        let base = LeadRecord::new("Jane", Platform::WhatsApp, LeadKind::GroupMembership, "s");
        assert!(matches!(base.identity_key(), Some(IdentityKey::Name(_))));

        let with_link = base.clone().with_profile_link("/in/jane");
        assert!(matches!(with_link.identity_key(), Some(IdentityKey::Profile(_))));

        let with_phone = with_link.with_phone("+33 6 12 34 56 78");
        assert_eq!(
            with_phone.identity_key(),
            Some(IdentityKey::Phone("+33612345678".into()))
        );
    }

    #[test]
    fn parses_kind_aliases() {
        assert_eq!("reactions".parse::<LeadKind>(), Ok(LeadKind::Reaction));
        assert_eq!("search-person".parse::<LeadKind>(), Ok(LeadKind::SearchPerson));
        assert!("likes".parse::<LeadKind>().is_err());
    }
}
