//! Agent Registry
//!
//! Agents are immutable personas defined at process start and looked up by id.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tool::{ToolDeclaration, ToolSpec};

/// Id of the agent used when nothing else is selected
pub const SUPERVISOR_AGENT_ID: &str = "supervisor-agent";

/// Presentation grouping for agents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Orchestration,
    Iaas,
    Strategy,
    Discovery,
    Design,
    Delivery,
    Engineering,
    Quality,
    Analytics,
    Marketing,
    Customer,
    Finance,
    Platform,
    Accountability,
}

impl Category {
    pub const ALL: [Self; 14] = [
        Self::Orchestration,
        Self::Iaas,
        Self::Strategy,
        Self::Discovery,
        Self::Design,
        Self::Delivery,
        Self::Engineering,
        Self::Quality,
        Self::Analytics,
        Self::Marketing,
        Self::Customer,
        Self::Finance,
        Self::Platform,
        Self::Accountability,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orchestration => "orchestration",
            Self::Iaas => "iaas",
            Self::Strategy => "strategy",
            Self::Discovery => "discovery",
            Self::Design => "design",
            Self::Delivery => "delivery",
            Self::Engineering => "engineering",
            Self::Quality => "quality",
            Self::Analytics => "analytics",
            Self::Marketing => "marketing",
            Self::Customer => "customer",
            Self::Finance => "finance",
            Self::Platform => "platform",
            Self::Accountability => "accountability",
        }
    }

    /// Display title
    pub const fn title(self) -> &'static str {
        match self {
            Self::Orchestration => "Orchestration & Control",
            Self::Iaas => "Idea as a Service (IAAS)",
            Self::Strategy => "Strategy & Value",
            Self::Discovery => "Discovery & Product",
            Self::Design => "Design & UX",
            Self::Delivery => "Delivery & Execution",
            Self::Engineering => "Engineering",
            Self::Quality => "Quality & SRE",
            Self::Analytics => "Data & Analytics",
            Self::Marketing => "Marketing & Growth",
            Self::Customer => "Customer Ops",
            Self::Finance => "Finance & Legal",
            Self::Platform => "Platform Ops",
            Self::Accountability => "Accountability",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named persona with a role, instruction text and callable tools
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique, stable key
    pub id: String,
    pub name: String,
    pub role: String,
    pub category: Category,
    pub icon: String,
    pub description: String,

    /// Persona instruction
    pub system_prompt: String,

    /// Declared tools in order; names are unique within the agent
    #[serde(default)]
    pub tools: Vec<ToolSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_prompts: Vec<String>,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            category,
            icon: String::new(),
            description: String::new(),
            system_prompt: String::new(),
            tools: Vec::new(),
            sample_prompts: Vec::new(),
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    #[must_use]
    pub fn sample_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.sample_prompts.push(prompt.into());
        self
    }

    /// Declared tool by call name
    pub fn find_tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Persona instruction sent as the system instruction
    pub fn persona(&self) -> String {
        format!(
            "You are {}. Role: {}. {}. Be concise and authoritative.",
            self.name,
            self.role,
            self.system_prompt.trim_end_matches('.')
        )
    }

    pub fn tool_declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(ToolSpec::declaration).collect()
    }

    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.role.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// Lookup contract used by the orchestration loop
pub trait AgentRegistry: Send + Sync {
    fn find_by_id(&self, id: &str) -> Option<Arc<Agent>>;

    /// All agents in roster order
    fn all(&self) -> Vec<Arc<Agent>>;

    /// Agents in `category` (if given) whose name, role or description
    /// contains `query` (if given), case-insensitively
    fn filter(&self, category: Option<Category>, query: Option<&str>) -> Vec<Arc<Agent>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        self.all()
            .into_iter()
            .filter(|a| category.is_none_or(|c| a.category == c))
            .filter(|a| query.is_none_or(|q| a.matches_query(q)))
            .collect()
    }

    /// Supervisor if present, otherwise the first agent
    fn default_agent(&self) -> Option<Arc<Agent>> {
        self.find_by_id(SUPERVISOR_AGENT_ID)
            .or_else(|| self.all().into_iter().next())
    }
}

/// Immutable, ordered agent roster
#[derive(Clone, Debug, Default)]
pub struct AgentRoster {
    agents: Vec<Arc<Agent>>,
}

impl AgentRoster {
    /// Build a roster; a later agent with a duplicate id is dropped
    pub fn new(agents: impl IntoIterator<Item = Agent>) -> Self {
        let mut roster: Vec<Arc<Agent>> = Vec::new();
        for agent in agents {
            if roster.iter().any(|a| a.id == agent.id) {
                tracing::warn!(agent = %agent.id, "duplicate agent id ignored");
                continue;
            }
            roster.push(Arc::new(agent));
        }
        Self { agents: roster }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentRegistry for AgentRoster {
    fn find_by_id(&self, id: &str) -> Option<Arc<Agent>> {
        self.agents.iter().find(|a| a.id == id).cloned()
    }

    fn all(&self) -> Vec<Arc<Agent>> {
        self.agents.clone()
    }
}
