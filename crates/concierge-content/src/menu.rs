//! The static menu tree.
//!
//! Nodes reference localization keys, never display text, so one tree
//! serves both languages and dispatch is independent of translations.

use std::collections::HashMap;

use concierge_core::NodeKey;

use crate::error::ContentError;

const APPOINTMENTS_URL: &str = "https://www.vwat.org/appointments/";
const EVENTS_URL: &str = "https://www.vwat.org/events/";

/// One option button: the key of its label and the node it leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionRef {
    pub label_key: &'static str,
    pub target: NodeKey,
}

/// A link attached to a leaf response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkRef {
    pub label_key: &'static str,
    pub url: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A prompt followed by option buttons.
    Menu {
        prompt_key: &'static str,
        options: Vec<OptionRef>,
    },
    /// A terminal response.
    Leaf {
        body_key: &'static str,
        links: Vec<LinkRef>,
    },
    /// Ask the user to describe their need; the next free text is answered
    /// with `fallback_key` instead of being classified.
    DetailPrompt {
        prompt_key: &'static str,
        fallback_key: &'static str,
    },
    /// Options built from the active program listings.
    Programs,
    /// Options built from the upcoming event listings.
    Events,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuNode {
    pub key: NodeKey,
    pub kind: NodeKind,
}

impl MenuNode {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// All menu nodes, keyed by [`NodeKey`].
#[derive(Clone, Debug)]
pub struct MenuTree {
    nodes: HashMap<NodeKey, MenuNode>,
}

fn opt(label_key: &'static str, target: NodeKey) -> OptionRef {
    OptionRef { label_key, target }
}

fn back() -> OptionRef {
    opt("backToMenu", NodeKey::Root)
}

fn booking() -> Vec<LinkRef> {
    vec![LinkRef {
        label_key: "bookAppointmentNow",
        url: APPOINTMENTS_URL,
    }]
}

impl MenuTree {
    /// The VWAT family-services menu.
    pub fn standard() -> Self {
        use NodeKey::*;

        let mut tree = Self {
            nodes: HashMap::new(),
        };

        tree.menu(
            Root,
            "helpQuestion",
            vec![
                opt("settlementHelp", SettlementHelp),
                opt("jobTraining", JobTraining),
                opt("englishClass", EnglishClass),
                opt("formsTax", FormsTax),
                opt("seniorServices", SeniorServices),
                opt("youthPrograms", YouthPrograms),
                opt("volunteerEvents", VolunteerEvents),
                opt("programs", Programs),
                opt("events", Events),
                opt("appointment", Appointment),
                opt("contactInfo", ContactInfo),
                opt("otherNotSure", OtherNotSure),
            ],
        );

        // === Settlement ===
        tree.menu(
            SettlementHelp,
            "settlementHelpIntro",
            vec![
                opt("findDoctor", FindDoctor),
                opt("enrollSchool", EnrollSchool),
                opt("newcomerBenefits", NewcomerBenefits),
                opt("immigrationDocs", ImmigrationDocs),
                opt("other", SettlementOther),
                back(),
            ],
        );
        tree.leaf(FindDoctor, "findDoctorResponse", booking());
        tree.leaf(EnrollSchool, "enrollSchoolResponse", booking());
        tree.leaf(NewcomerBenefits, "newcomerBenefitsResponse", booking());
        tree.leaf(ImmigrationDocs, "immigrationDocsResponse", booking());
        tree.detail(SettlementOther, "otherPrompt", "settlementFallback");

        // === Employment ===
        tree.menu(
            JobTraining,
            "jobTrainingIntro",
            vec![
                opt("jobSearch", JobSearch),
                opt("trainingPrograms", TrainingPrograms),
                opt("other", EmploymentOther),
                back(),
            ],
        );
        tree.leaf(JobSearch, "jobSearchResponse", booking());
        tree.leaf(TrainingPrograms, "trainingProgramsResponse", booking());
        tree.detail(EmploymentOther, "otherPrompt", "employmentFallback");

        // === English ===
        tree.menu(
            EnglishClass,
            "englishClassIntro",
            vec![
                opt("joinConversationClass", JoinConversationClass),
                opt("bookYMCAAssessment", BookYmcaAssessment),
                opt("findClassSchedule", FindClassSchedule),
                opt("otherNotSureOption", EnglishOther),
                back(),
            ],
        );
        tree.leaf(JoinConversationClass, "joinConversationClassResponse", booking());
        tree.leaf(BookYmcaAssessment, "bookYMCAAssessmentResponse", booking());
        tree.leaf(FindClassSchedule, "findClassScheduleResponse", booking());
        tree.detail(EnglishOther, "otherPrompt", "languageFallback");

        // === Forms and tax ===
        tree.menu(
            FormsTax,
            "formsTaxIntro",
            vec![
                opt("helpWithForms", HelpWithForms),
                opt("personalIncomeTax", PersonalIncomeTax),
                opt("other", FormsTaxOther),
                back(),
            ],
        );
        tree.leaf(HelpWithForms, "helpWithFormsResponse", booking());
        tree.leaf(PersonalIncomeTax, "personalIncomeTaxResponse", booking());
        tree.detail(FormsTaxOther, "otherPrompt", "formsTaxFallback");

        // === Seniors ===
        tree.menu(
            SeniorServices,
            "seniorServicesIntro",
            vec![
                opt("seniorPrograms", SeniorPrograms),
                opt("wellnessBenefits", WellnessBenefits),
                opt("other", SeniorOther),
                back(),
            ],
        );
        tree.leaf(SeniorPrograms, "seniorProgramsResponse", vec![]);
        tree.leaf(WellnessBenefits, "wellnessBenefitsResponse", vec![]);
        tree.detail(SeniorOther, "otherPrompt", "seniorFallback");

        // === Youth ===
        tree.menu(
            YouthPrograms,
            "youthProgramsIntro",
            vec![
                opt("youthActivities", YouthActivities),
                opt("careerSkills", CareerSkills),
                opt("other", YouthOther),
                back(),
            ],
        );
        tree.leaf(YouthActivities, "youthActivitiesResponse", vec![]);
        tree.leaf(CareerSkills, "careerSkillsResponse", vec![]);
        tree.detail(YouthOther, "otherPrompt", "youthFallback");

        // === Volunteering, events, partnerships ===
        tree.menu(
            VolunteerEvents,
            "volunteerEventsIntro",
            vec![
                opt("volunteerOpportunities", VolunteerOpportunities),
                opt("communityEvents", CommunityEvents),
                opt("partnership", Partnership),
                back(),
            ],
        );
        tree.leaf(VolunteerOpportunities, "volunteerOpportunitiesResponse", vec![]);
        tree.leaf(CommunityEvents, "communityEventsResponse", vec![]);
        tree.menu(
            Partnership,
            "partnershipIntro",
            vec![
                opt("employer", Employer),
                opt("organization", Organization),
                opt("other", PartnershipOther),
                back(),
            ],
        );
        tree.leaf(Employer, "employerResponse", vec![]);
        tree.leaf(Organization, "organizationResponse", vec![]);
        tree.detail(PartnershipOther, "otherPrompt", "partnershipFallback");

        tree.detail(OtherNotSure, "otherNotSureIntro", "otherNotSureFallback");

        // === Listings and direct answers ===
        tree.insert(Programs, NodeKind::Programs);
        tree.insert(Events, NodeKind::Events);
        tree.leaf(
            MorePrograms,
            "moreProgramsResponse",
            vec![LinkRef {
                label_key: "viewAllEvents",
                url: EVENTS_URL,
            }],
        );
        tree.leaf(Appointment, "appointmentResponse", booking());
        tree.leaf(ContactInfo, "contactInfoDesc", vec![]);
        tree.leaf(MenuFallback, "menuFallback", vec![]);

        tree
    }

    fn insert(&mut self, key: NodeKey, kind: NodeKind) {
        self.nodes.insert(key, MenuNode { key, kind });
    }

    fn menu(&mut self, key: NodeKey, prompt_key: &'static str, options: Vec<OptionRef>) {
        self.insert(key, NodeKind::Menu { prompt_key, options });
    }

    fn leaf(&mut self, key: NodeKey, body_key: &'static str, links: Vec<LinkRef>) {
        self.insert(key, NodeKind::Leaf { body_key, links });
    }

    fn detail(&mut self, key: NodeKey, prompt_key: &'static str, fallback_key: &'static str) {
        self.insert(
            key,
            NodeKind::DetailPrompt {
                prompt_key,
                fallback_key,
            },
        );
    }

    pub fn node(&self, key: NodeKey) -> Option<&MenuNode> {
        self.nodes.get(&key)
    }

    pub fn root(&self) -> Option<&MenuNode> {
        self.node(NodeKey::Root)
    }

    /// Options of a `Menu` node, empty for every other kind.
    pub fn options(&self, key: NodeKey) -> &[OptionRef] {
        match self.node(key).map(|n| &n.kind) {
            Some(NodeKind::Menu { options, .. }) => options,
            _ => &[],
        }
    }

    /// Every option of every menu, in a stable order (root first).
    pub fn all_options(&self) -> Vec<OptionRef> {
        let mut keys: Vec<_> = self.nodes.keys().copied().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|k| self.options(k).iter().copied())
            .collect()
    }

    /// Every localization key the tree refers to.
    pub fn string_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        for node in self.nodes.values() {
            match &node.kind {
                NodeKind::Menu { prompt_key, options } => {
                    keys.push(*prompt_key);
                    keys.extend(options.iter().map(|o| o.label_key));
                }
                NodeKind::Leaf { body_key, links } => {
                    keys.push(*body_key);
                    keys.extend(links.iter().map(|l| l.label_key));
                }
                NodeKind::DetailPrompt {
                    prompt_key,
                    fallback_key,
                } => {
                    keys.push(*prompt_key);
                    keys.push(*fallback_key);
                }
                NodeKind::Programs | NodeKind::Events => {}
            }
        }
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Check that the root exists and every option resolves to a node.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.root().is_none() {
            return Err(ContentError::InvalidMenu("missing root node".to_string()));
        }
        for node in self.nodes.values() {
            if let NodeKind::Menu { options, .. } = &node.kind {
                if options.is_empty() {
                    return Err(ContentError::InvalidMenu(format!(
                        "menu {} has no options",
                        node.key
                    )));
                }
                for option in options {
                    if !self.nodes.contains_key(&option.target) {
                        return Err(ContentError::InvalidMenu(format!(
                            "option {} in {} points to missing node {}",
                            option.label_key, node.key, option.target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::builtin;
    use concierge_core::Language;

    #[test]
    fn test_standard_tree_is_valid() {
        let tree = MenuTree::standard();
        tree.validate().unwrap();
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_root_has_all_topics() {
        let tree = MenuTree::standard();
        let targets: Vec<NodeKey> = tree.options(NodeKey::Root).iter().map(|o| o.target).collect();
        assert_eq!(targets.len(), 12);
        assert_eq!(targets[0], NodeKey::SettlementHelp);
        assert!(targets.contains(&NodeKey::Programs));
        assert!(targets.contains(&NodeKey::ContactInfo));
        assert!(!targets.contains(&NodeKey::Root));
    }

    #[test]
    fn test_submenus_end_with_back_to_menu() {
        let tree = MenuTree::standard();
        for key in [
            NodeKey::SettlementHelp,
            NodeKey::JobTraining,
            NodeKey::EnglishClass,
            NodeKey::FormsTax,
            NodeKey::SeniorServices,
            NodeKey::YouthPrograms,
            NodeKey::VolunteerEvents,
            NodeKey::Partnership,
        ] {
            let last = tree.options(key).last().copied().unwrap();
            assert_eq!(last.target, NodeKey::Root, "{key}");
            assert_eq!(last.label_key, "backToMenu");
        }
    }

    #[test]
    fn test_every_string_key_is_built_in() {
        let tree = MenuTree::standard();
        for lang in Language::ALL {
            for key in tree.string_keys() {
                assert!(builtin(lang).contains_key(key), "{key} missing for {lang}");
            }
        }
    }

    #[test]
    fn test_other_options_are_detail_prompts() {
        let tree = MenuTree::standard();
        let node = tree.node(NodeKey::SettlementOther).unwrap();
        assert_eq!(
            node.kind,
            NodeKind::DetailPrompt {
                prompt_key: "otherPrompt",
                fallback_key: "settlementFallback"
            }
        );
        assert!(!node.is_terminal());
    }

    #[test]
    fn test_appointment_leaf_has_booking_link() {
        let tree = MenuTree::standard();
        match &tree.node(NodeKey::Appointment).unwrap().kind {
            NodeKind::Leaf { links, .. } => {
                assert_eq!(links[0].url, APPOINTMENTS_URL);
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_detects_dangling_option() {
        let mut tree = MenuTree::standard();
        tree.nodes.remove(&NodeKey::FindDoctor);
        let err = tree.validate().unwrap_err();
        assert!(err.to_string().contains("find_doctor"));
    }

    #[test]
    fn test_validate_detects_missing_root() {
        let mut tree = MenuTree::standard();
        tree.nodes.remove(&NodeKey::Root);
        assert!(matches!(tree.validate(), Err(ContentError::InvalidMenu(_))));
    }

    #[test]
    fn test_all_options_starts_with_root() {
        let tree = MenuTree::standard();
        let all = tree.all_options();
        assert_eq!(all[0].target, NodeKey::SettlementHelp);
        assert!(all.iter().any(|o| o.target == NodeKey::FindDoctor));
    }
}
