use serde::{Deserialize, Serialize};

/// The archetypal role a session plays.
///
/// PM coordinates a project and its team; Specialists do focused work under
/// a project; Assistants are one-off helpers with no project affiliation;
/// `agent_assistant`/`skill_assistant` are the editing sessions backing the
/// agent/skill authoring tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Project-Manager session. Requires a `project_id`.
    Pm,
    /// Specialist worker session scoped to a project.
    Specialist,
    /// Standalone assistant session with no project affiliation.
    Assistant,
    /// Session backing the agent-authoring assistant tools.
    AgentAssistant,
    /// Session backing the skill-authoring assistant tools.
    SkillAssistant,
}

impl SessionType {
    /// Whether this session type requires a non-empty `project_id`.
    #[must_use]
    pub fn requires_project(self) -> bool {
        matches!(self, Self::Pm)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pm => "pm",
            Self::Specialist => "specialist",
            Self::Assistant => "assistant",
            Self::AgentAssistant => "agent_assistant",
            Self::SkillAssistant => "skill_assistant",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pm_requires_a_project() {
        assert!(SessionType::Pm.requires_project());
        assert!(!SessionType::Specialist.requires_project());
        assert!(!SessionType::Assistant.requires_project());
        assert!(!SessionType::AgentAssistant.requires_project());
        assert!(!SessionType::SkillAssistant.requires_project());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&SessionType::AgentAssistant).unwrap();
        assert_eq!(json, "\"agent_assistant\"");
    }
}
