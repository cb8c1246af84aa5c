//! Ordered keyword rules.
//!
//! Each rule carries English and Vietnamese keywords. Rules are evaluated in
//! declaration order and the first match wins, so more specific phrasings
//! precede the general topic rule of the same category.

use concierge_core::NodeKey;
use regex::Regex;

/// One compiled keyword rule.
pub struct Rule {
    pub name: &'static str,
    pub target: NodeKey,
    pattern: Regex,
    unless: Option<Regex>,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, target: NodeKey) -> Self {
        Self {
            name,
            target,
            pattern: Regex::new(pattern).expect("Invalid intent rule regex"),
            unless: None,
        }
    }

    fn unless(mut self, pattern: &str) -> Self {
        self.unless = Some(Regex::new(pattern).expect("Invalid intent exclusion regex"));
        self
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text) && !self.unless.as_ref().is_some_and(|re| re.is_match(text))
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// The full ordered rule list.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        let rules = vec![
            // =================================================================
            // Appointment (always first)
            // =================================================================
            Rule::new(
                "appointment",
                r"(?i)appointment|\bbook\b.*\b(?:visit|meeting)\b|lịch hẹn|đặt hẹn|hẹn gặp",
                NodeKey::Appointment,
            ),
            // =================================================================
            // Overview questions
            // =================================================================
            Rule::new(
                "services_list",
                r"(?i)what services|services do you offer|dịch vụ gì|dịch vụ nào",
                NodeKey::Root,
            ),
            Rule::new(
                "programs_list",
                r"(?i)what programs|programs available|list programs|chương trình nào|chương trình gì|danh sách chương trình",
                NodeKey::Programs,
            )
            .unless(r"(?i)senior|youth|cao tuổi|thanh niên|thanh thiếu niên"),
            Rule::new(
                "contact",
                r"(?i)contact|phone|email|address|location|where is vwat|where are you located|liên hệ|điện thoại|địa chỉ|ở đâu",
                NodeKey::ContactInfo,
            ),
            // =================================================================
            // Settlement
            // =================================================================
            Rule::new(
                "doctor",
                r"(?i)doctor|ohip|health card|bác sĩ|thẻ sức khỏe|thẻ y tế",
                NodeKey::FindDoctor,
            ),
            Rule::new(
                "school",
                r"(?i)\benrol|school|trường học|nhập học|đi học",
                NodeKey::EnrollSchool,
            ),
            Rule::new(
                "newcomer_benefits",
                r"(?i)child benefit|newcomer benefit|\bsin\b|social insurance|trợ cấp trẻ em|trợ cấp",
                NodeKey::NewcomerBenefits,
            ),
            Rule::new(
                "immigration",
                r"(?i)immigration|permanent resident|\bpr documents?\b|di trú|thường trú",
                NodeKey::ImmigrationDocs,
            ),
            Rule::new(
                "settlement",
                r"(?i)settle|newcomer|new to canada|định cư|mới đến|mới sang",
                NodeKey::SettlementHelp,
            ),
            // =================================================================
            // Employment
            // =================================================================
            Rule::new(
                "job_search",
                r"(?i)job search|resume|résumé|interview|find (?:a )?job|tìm việc|phỏng vấn|sơ yếu lý lịch",
                NodeKey::JobSearch,
            ),
            Rule::new(
                "training",
                r"(?i)training|food safety|nail tech|khóa học nghề|đào tạo",
                NodeKey::TrainingPrograms,
            ),
            Rule::new(
                "employment",
                r"(?i)\bjobs?\b|employment|\bwork\b|việc làm|công việc",
                NodeKey::JobTraining,
            ),
            // =================================================================
            // English
            // =================================================================
            Rule::new(
                "language_assessment",
                r"(?i)ymca|\blinc\b|language assessment|đánh giá ngôn ngữ",
                NodeKey::BookYmcaAssessment,
            ),
            Rule::new(
                "conversation_class",
                r"(?i)conversation (?:class|circle)|lớp đàm thoại|lớp hội thoại",
                NodeKey::JoinConversationClass,
            ),
            Rule::new(
                "class_schedule",
                r"(?i)(?:evening|weekend|online|part-time|full-time) class|class schedule|lịch học",
                NodeKey::FindClassSchedule,
            ),
            Rule::new(
                "english",
                r"(?i)english|\besl\b|tiếng anh|anh văn",
                NodeKey::EnglishClass,
            ),
            // =================================================================
            // Forms and tax
            // =================================================================
            Rule::new(
                "income_tax",
                r"(?i)\btax|cvitp|khai thuế|thuế",
                NodeKey::PersonalIncomeTax,
            ),
            Rule::new(
                "forms",
                r"(?i)\bforms?\b|renew|licen[cs]e|citizenship|translation|commissioner|giấy tờ|điền đơn|mẫu đơn|quốc tịch|bằng lái",
                NodeKey::HelpWithForms,
            ),
            // =================================================================
            // Seniors
            // =================================================================
            Rule::new(
                "senior_benefits",
                r"(?i)ontario works|odsp|\boas\b|\bgis\b|\bcpp\b|pension|subsidi[sz]ed housing|lương hưu|trợ cấp xã hội",
                NodeKey::WellnessBenefits,
            ),
            Rule::new(
                "senior",
                r"(?i)senior|elderly|cao tuổi|người già|người lớn tuổi",
                NodeKey::SeniorServices,
            ),
            // =================================================================
            // Youth
            // =================================================================
            Rule::new(
                "youth",
                r"(?i)youth|teen|thanh niên|thanh thiếu niên",
                NodeKey::YouthPrograms,
            ),
            // =================================================================
            // Volunteering, partnerships, events
            // =================================================================
            Rule::new(
                "volunteer",
                r"(?i)volunteer|tình nguyện",
                NodeKey::VolunteerOpportunities,
            ),
            Rule::new(
                "partnership",
                r"(?i)partner|collaborat|employer|\bhire\b|\bhiring\b|hợp tác|tuyển dụng",
                NodeKey::Partnership,
            ),
            Rule::new(
                "community_events",
                r"(?i)community events?|sự kiện cộng đồng",
                NodeKey::CommunityEvents,
            ),
            Rule::new(
                "events",
                r"(?i)\bevents?\b|festival|sự kiện|lễ hội",
                NodeKey::Events,
            ),
        ];

        Self { rules }
    }

    /// The first rule matching `text`, in declaration order.
    pub fn first_match(&self, text: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(text))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
