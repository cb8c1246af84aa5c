use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConciergeError;

// =============================================================================
// Language
// =============================================================================

/// Conversation language. Vietnamese is the default for first-time visitors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Vi, Language::En];

    /// Wire code used in content file names and backend payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Vi => "vi",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConciergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" | "vietnamese" => Ok(Language::Vi),
            "en" | "english" => Ok(Language::En),
            other => Err(ConciergeError::UnsupportedLanguage(other.to_string())),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Opaque per-profile conversation identity, sent to the backend as `user_id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("user_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Menu vocabulary
// =============================================================================

/// Stable logical key of every node in the menu tree.
///
/// Dispatch happens on these keys, never on translated labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKey {
    Root,

    SettlementHelp,
    FindDoctor,
    EnrollSchool,
    NewcomerBenefits,
    ImmigrationDocs,
    SettlementOther,

    JobTraining,
    JobSearch,
    TrainingPrograms,
    EmploymentOther,

    EnglishClass,
    JoinConversationClass,
    BookYmcaAssessment,
    FindClassSchedule,
    EnglishOther,

    FormsTax,
    HelpWithForms,
    PersonalIncomeTax,
    FormsTaxOther,

    SeniorServices,
    SeniorPrograms,
    WellnessBenefits,
    SeniorOther,

    YouthPrograms,
    YouthActivities,
    CareerSkills,
    YouthOther,

    VolunteerEvents,
    VolunteerOpportunities,
    CommunityEvents,
    Partnership,
    Employer,
    Organization,
    PartnershipOther,

    OtherNotSure,

    Programs,
    MorePrograms,
    Events,
    Appointment,
    ContactInfo,
    MenuFallback,
}

impl NodeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKey::Root => "root",
            NodeKey::SettlementHelp => "settlement_help",
            NodeKey::FindDoctor => "find_doctor",
            NodeKey::EnrollSchool => "enroll_school",
            NodeKey::NewcomerBenefits => "newcomer_benefits",
            NodeKey::ImmigrationDocs => "immigration_docs",
            NodeKey::SettlementOther => "settlement_other",
            NodeKey::JobTraining => "job_training",
            NodeKey::JobSearch => "job_search",
            NodeKey::TrainingPrograms => "training_programs",
            NodeKey::EmploymentOther => "employment_other",
            NodeKey::EnglishClass => "english_class",
            NodeKey::JoinConversationClass => "join_conversation_class",
            NodeKey::BookYmcaAssessment => "book_ymca_assessment",
            NodeKey::FindClassSchedule => "find_class_schedule",
            NodeKey::EnglishOther => "english_other",
            NodeKey::FormsTax => "forms_tax",
            NodeKey::HelpWithForms => "help_with_forms",
            NodeKey::PersonalIncomeTax => "personal_income_tax",
            NodeKey::FormsTaxOther => "forms_tax_other",
            NodeKey::SeniorServices => "senior_services",
            NodeKey::SeniorPrograms => "senior_programs",
            NodeKey::WellnessBenefits => "wellness_benefits",
            NodeKey::SeniorOther => "senior_other",
            NodeKey::YouthPrograms => "youth_programs",
            NodeKey::YouthActivities => "youth_activities",
            NodeKey::CareerSkills => "career_skills",
            NodeKey::YouthOther => "youth_other",
            NodeKey::VolunteerEvents => "volunteer_events",
            NodeKey::VolunteerOpportunities => "volunteer_opportunities",
            NodeKey::CommunityEvents => "community_events",
            NodeKey::Partnership => "partnership",
            NodeKey::Employer => "employer",
            NodeKey::Organization => "organization",
            NodeKey::PartnershipOther => "partnership_other",
            NodeKey::OtherNotSure => "other_not_sure",
            NodeKey::Programs => "programs",
            NodeKey::MorePrograms => "more_programs",
            NodeKey::Events => "events",
            NodeKey::Appointment => "appointment",
            NodeKey::ContactInfo => "contact_info",
            NodeKey::MenuFallback => "menu_fallback",
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rendered option button leads to when chosen.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum OptionTarget {
    /// A static node of the menu tree.
    Node(NodeKey),
    /// A program record, identified by name within the current language.
    Program(String),
    /// An event record, identified by name.
    Event(String),
}

/// Answer to the "anything else?" follow-up prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickReply {
    Yes,
    No,
}

/// A link rendered under a bot turn (e.g. "Book Your Appointment Now").
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuxLink {
    pub label: String,
    pub url: String,
}

// =============================================================================
// Externally sourced records
// =============================================================================

/// A program or event record as published in the content files.
///
/// Immutable once loaded. Boolean flags accept JSON booleans or the
/// spreadsheet-style `"yes"`/`"no"` strings; `is_featured` is also read from
/// the legacy `news` column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "flexible::opt_text")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "flexible::opt_text")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "flexible::opt_text")]
    pub capacity: Option<String>,
    #[serde(default, deserialize_with = "flexible::yes_no")]
    pub expired: bool,
    #[serde(
        default,
        alias = "news",
        alias = "isFeatured",
        alias = "featured",
        deserialize_with = "flexible::yes_no"
    )]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

pub type Program = Listing;
pub type Event = Listing;

impl Listing {
    /// Active records are shown in menus; expired ones never are.
    pub fn is_active(&self) -> bool {
        !self.expired
    }
}

/// One citation returned by the generation backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub source: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One (selection, response) pair reported to the interaction sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub selection: String,
    pub response: String,
    pub language: Language,
    pub user_id: SessionId,
}

mod flexible {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    pub fn yes_no<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Option::<Flag>::deserialize(d)? {
            None => false,
            Some(Flag::Bool(b)) => b,
            Some(Flag::Number(n)) => n != 0,
            Some(Flag::Text(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "1"
            ),
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Number(serde_json::Number),
        Text(String),
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Text>::deserialize(d)? {
            None => None,
            Some(Text::Number(n)) => Some(n.to_string()),
            Some(Text::Text(s)) if s.trim().is_empty() || s == "nan" => None,
            Some(Text::Text(s)) => Some(s),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Vi.code(), "vi");
        assert_eq!(Language::En.code(), "en");
        assert_eq!(Language::default(), Language::Vi);
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" VI ".parse::<Language>().unwrap(), Language::Vi);
        assert_eq!("English".parse::<Language>().unwrap(), Language::En);
        assert!(matches!(
            "fr".parse::<Language>(),
            Err(ConciergeError::UnsupportedLanguage(code)) if code == "fr"
        ));
    }

    #[test]
    fn test_language_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
        let lang: Language = serde_json::from_str("\"vi\"").unwrap();
        assert_eq!(lang, Language::Vi);
    }

    #[test]
    fn test_session_id_shape() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert!(a.as_str().starts_with("user_"));
        assert_ne!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), format!("\"{}\"", a));
    }

    #[test]
    fn test_node_key_serde_matches_as_str() {
        for key in [NodeKey::Root, NodeKey::BookYmcaAssessment, NodeKey::ContactInfo] {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_option_target_serde() {
        let target = OptionTarget::Program("ESL Circle".to_string());
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["kind"], "program");
        assert_eq!(json["key"], "ESL Circle");

        let node: OptionTarget =
            serde_json::from_str(r#"{"kind":"node","key":"find_doctor"}"#).unwrap();
        assert_eq!(node, OptionTarget::Node(NodeKey::FindDoctor));
    }

    #[test]
    fn test_listing_yes_no_strings() {
        let listing: Listing = serde_json::from_str(
            r#"{"name":"ESL Circle","description":"Practice","expired":"no","news":"yes"}"#,
        )
        .unwrap();
        assert!(!listing.expired);
        assert!(listing.is_featured);
        assert!(listing.is_active());
    }

    #[test]
    fn test_listing_boolean_and_numeric_fields() {
        let listing: Listing = serde_json::from_str(
            r#"{"name":"Tet Festival","expired":true,"is_featured":false,"capacity":40,"date":"2025-01-29"}"#,
        )
        .unwrap();
        assert!(listing.expired);
        assert!(!listing.is_featured);
        assert_eq!(listing.capacity.as_deref(), Some("40"));
        assert_eq!(listing.date.as_deref(), Some("2025-01-29"));
        assert!(listing.time.is_none());
    }

    #[test]
    fn test_listing_missing_fields_default() {
        let listing: Listing = serde_json::from_str(r#"{"name":"Drop-in"}"#).unwrap();
        assert!(!listing.expired);
        assert!(!listing.is_featured);
        assert!(listing.description.is_empty());
        assert!(listing.link.is_none());
    }

    #[test]
    fn test_listing_blank_capacity_is_none() {
        let listing: Listing =
            serde_json::from_str(r#"{"name":"Circle","capacity":"nan","time":" "}"#).unwrap();
        assert!(listing.capacity.is_none());
        assert!(listing.time.is_none());
    }

    #[test]
    fn test_source_ref_keeps_extra_fields() {
        let source: SourceRef =
            serde_json::from_str(r#"{"source":"faqs.json","score":0.82}"#).unwrap();
        assert_eq!(source.source, "faqs.json");
        assert!(source.extra.contains_key("score"));
    }

    #[test]
    fn test_interaction_record_wire_shape() {
        let record = InteractionRecord {
            selection: "I need a doctor".to_string(),
            response: "VWAT can help".to_string(),
            language: Language::En,
            user_id: SessionId("user_1".to_string()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["selection"], "I need a doctor");
        assert_eq!(json["language"], "en");
        assert_eq!(json["user_id"], "user_1");
    }
}
