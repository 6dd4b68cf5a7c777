//! Bundled Agent Roster

use orchestra_core::tool::{DELEGATE_FUNCTION, ORCHESTRA_PROVIDER};
use orchestra_core::{Agent, AgentRoster, Category, ParamType, ParameterSchema, SUPERVISOR_AGENT_ID, ToolSpec};

// (id, name, role, category, icon, description, system prompt)
type Row = (&'static str, &'static str, &'static str, Category, &'static str, &'static str, &'static str);

const SPECIALISTS: &[Row] = &[
    ("strategy-agent", "Strategy Agent", "Strategic Advisor", Category::Strategy, "🎯",
        "Aligns product initiatives with long-term company goals.",
        "Focus on long-term strategy and competitive positioning."),
    ("value-agent", "Business Value Agent", "Value Architect", Category::Strategy, "💰",
        "Calculates ROI and builds the business case for new features.",
        "Focus on business value, KPIs, and ROI modeling."),
    ("pricing-agent", "Pricing Agent", "Economics Lead", Category::Strategy, "🏷️",
        "Handles unit economics and pricing strategy.",
        "Analyze unit economics and market pricing tiers."),
    ("risk-agent", "Risk Agent", "RAID Coordinator", Category::Strategy, "⚠️",
        "Manages the RAID log and Architectural Decision Records (ADR).",
        "Identify risks, assumptions, issues, and dependencies."),
    ("approval-agent", "Approval Agent", "Governance Gatekeeper", Category::Strategy, "✅",
        "Provides recommendations for executive sign-off.",
        "Review inputs and provide a clear recommendation for approval."),
    ("discovery-agent", "Discovery Agent", "Discovery Lead", Category::Discovery, "🔭",
        "Facilitates problem discovery and solution ideation.",
        "Lead discovery workshops and problem space mapping."),
    ("pm-agent", "Product Manager", "Product Lead", Category::Discovery, "📋",
        "Owns product vision, Jira backlogs, and Miro boards.",
        "Translate vision into actionable roadmaps and backlog items."),
    ("research-agent", "User Research Agent", "Insights Researcher", Category::Discovery, "🔍",
        "Synthesizes user research and feedback into actionable insights.",
        "Analyze user behavior data and research findings."),
    ("backlog-agent", "Refinement Agent", "Backlog Specialist", Category::Discovery, "🧹",
        "Keeps the backlog refined, estimated, and ready for development.",
        "Focus on story readiness and definition of ready."),
    ("design-agent", "Design Agent", "UI/UX Architect", Category::Design, "🎨",
        "Ensures UI/UX consistency and high design standards.",
        "Create user-centric designs and wireframes."),
    ("design-system-agent", "Design System Agent", "Accessibility Lead", Category::Design, "📏",
        "Maintains the design system and ensures accessibility (A11y).",
        "Ensure brand consistency and WCAG compliance."),
    ("delivery-mgr-agent", "Delivery Manager", "Execution Lead", Category::Delivery, "🚀",
        "Tracks project progress and removes delivery bottlenecks.",
        "Monitor delivery timelines and manage stakeholder expectations."),
    ("scrum-agent", "Scrum Master", "Jira Monitor", Category::Delivery, "🔄",
        "Monitors Jira boards, cycle time, and team velocity.",
        "Facilitate agile ceremonies and monitor team health metrics."),
    ("release-agent", "Release Manager", "Deployment Coordinator", Category::Delivery, "📦",
        "Coordinates release windows and environment readiness.",
        "Plan and coordinate production deployments."),
    ("dependency-agent", "Dependency Agent", "Risk Coordinator", Category::Delivery, "🔗",
        "Tracks cross-team dependencies and delivery risks.",
        "Coordinate across teams to resolve blocking dependencies."),
    ("code-agent", "Code Agent", "Lead Developer", Category::Engineering, "💻",
        "Autonomous code generation and Pull Request management.",
        "Write high-quality, documented, and tested code."),
    ("arch-agent", "Architecture Agent", "Tech Standards Lead", Category::Engineering, "🏗️",
        "Ensures adherence to tech standards and architectural patterns.",
        "Enforce architectural patterns and technical excellence."),
    ("security-agent", "Security Agent", "SecOps Lead", Category::Engineering, "🔐",
        "Manages secrets, vulnerability scans, and security posture.",
        "Secure the application and manage environment secrets."),
    ("test-agent", "Testing Agent", "QA Automation Lead", Category::Quality, "🧪",
        "Generates and executes automated test suites.",
        "Create comprehensive test plans and automation scripts."),
    ("dod-agent", "Quality Gate Agent", "DoD Auditor", Category::Quality, "🛡️",
        "Audits features against the Definition of Done (DoD).",
        "Ensure every PR meets the quality and documentation gates."),
    ("sre-agent", "SRE Agent", "Observability Lead", Category::Quality, "📈",
        "Monitors system health, SLIs, and SLOs.",
        "Maximize system reliability and manage monitoring tools."),
    ("incident-agent", "Incident Agent", "Post-Mortem Lead", Category::Quality, "🚨",
        "Manages incident response and post-mortem analysis.",
        "Coordinate incident resolution and lead root-cause analysis."),
    ("analytics-agent", "Analytics Agent", "Event Architect", Category::Analytics, "📊",
        "Manages event tracking and data instrumentation.",
        "Design and audit data tracking and telemetry."),
    ("experiment-agent", "A/B Testing Agent", "Experimentation Lead", Category::Analytics, "🧪",
        "Runs experimentation and A/B testing analysis.",
        "Analyze experiment results and suggest optimizations."),
    ("data-quality-agent", "Data Quality Agent", "Anomaly Lead", Category::Analytics, "📉",
        "Detects data anomalies and ensures pipeline integrity.",
        "Monitor data pipelines and flag quality issues."),
];

const LATE_SPECIALISTS: &[Row] = &[
    ("lifecycle-agent", "Lifecycle Agent", "CRM Automation Lead", Category::Marketing, "📧",
        "Manages email and CRM automation flows.",
        "Design user lifecycle and retention automation."),
    ("content-agent", "Content Agent", "Community Lead", Category::Marketing, "✍️",
        "Generates content and manages community engagement.",
        "Write engaging copy and manage social interactions."),
    ("support-agent", "Support Agent", "Customer Success", Category::Customer, "🎧",
        "Provides customer support and triage.",
        "Help users solve problems and improve satisfaction."),
    ("knowledge-agent", "Knowledge Agent", "Help Content Lead", Category::Customer, "📚",
        "Maintains the help center and documentation.",
        "Keep technical and user documentation up to date."),
    ("escalation-agent", "Escalation Agent", "Triage Lead", Category::Customer, "🚩",
        "Handles critical customer escalations and triage.",
        "Prioritize and resolve high-severity user issues."),
    ("finance-agent", "Finance Agent", "Cost Lead", Category::Finance, "⚖️",
        "Handles cost management and financial reporting.",
        "Optimize spend and manage budgets."),
    ("legal-agent", "Legal Agent", "Policy Lead", Category::Finance, "📑",
        "Manages legal compliance and policy reviews.",
        "Review contracts and ensure regulatory compliance."),
    ("privacy-agent", "Data Protection Agent", "Compliance Lead", Category::Finance, "🛡️",
        "Ensures data protection and GDPR compliance.",
        "Maintain data privacy and compliance standards."),
    ("infra-agent", "Infrastructure Agent", "Cost Optimizer", Category::Platform, "☁️",
        "Optimizes cloud infrastructure and cloud spend.",
        "Manage cloud resources and optimize infrastructure."),
    ("vendor-agent", "Vendor Agent", "Integration Lead", Category::Platform, "🤝",
        "Manages third-party vendor integrations.",
        "Manage vendor relationships and API integrations."),
    ("human-owner", "Human Owner", "Final Accountability", Category::Accountability, "👑",
        "Final sign-off and strategic accountability (Non-automatable).",
        "The ultimate authority. Review all autonomous outputs."),
];

fn from_row(&(id, name, role, category, icon, description, prompt): &Row) -> Agent {
    Agent::new(id, name, role, category)
        .icon(icon)
        .description(description)
        .system_prompt(prompt)
}

fn supervisor() -> Agent {
    Agent::new(SUPERVISOR_AGENT_ID, "The Conductor", "Chief Orchestra Supervisor", Category::Orchestration)
        .icon("🪄")
        .description("Autonomous coordinator that manages complex requests by delegating to specialized agents.")
        .system_prompt("You are the master supervisor. Break requests down and delegate to specialized agents.")
        .tool(
            ToolSpec::new(
                DELEGATE_FUNCTION,
                "Hands off a specific sub-task to a specialized agent and waits for their expert output.",
                ORCHESTRA_PROVIDER,
            )
            .param(ParameterSchema::required("agent_id", ParamType::String, "Agent ID"))
            .param(ParameterSchema::required("task", ParamType::String, "Instructions for the agent.")),
        )
        .sample_prompt("Plan the Q3 launch: have the PM draft backlog items and marketing prepare the campaign.")
        .sample_prompt("Ask the code agent to review the caching layer.")
}

fn marketing() -> Agent {
    Agent::new("marketing-agent", "Marketing Agent", "Growth Strategist", Category::Marketing)
        .icon("📣")
        .description("Handles broader marketing strategy and campaign planning.")
        .system_prompt(
            "Drive user acquisition and campaign performance. You can now post video content directly to Instagram using provided tools.",
        )
        .tool(
            ToolSpec::new(
                "post_instagram_video",
                "Posts a video to Instagram with a specific caption.",
                "instagram",
            )
            .param(ParameterSchema::required(
                "video_url",
                ParamType::String,
                "The public URL of the video to post.",
            ))
            .param(ParameterSchema::required(
                "caption",
                ParamType::String,
                "The caption for the Instagram post.",
            )),
        )
        .sample_prompt("Post our launch teaser video to Instagram.")
}

fn seo() -> Agent {
    Agent::new("seo-agent", "Growth & SEO", "SEO Architect", Category::Marketing)
        .icon("⚡")
        .description("Handles digital presence, content, and SEO performance auditing.")
        .system_prompt("Optimize for organic growth. Monitor SEO performance.")
        .tool(
            ToolSpec::new(
                "get_seo_report",
                "Fetches lighthouse and SEO performance scores for the production site.",
                "seo_perf",
            )
            .param(ParameterSchema::required("domain", ParamType::String, "Target domain")),
        )
        .sample_prompt("Audit SEO performance for kloud.io.")
}

/// Every bundled agent in display order
pub fn default_agents() -> Vec<Agent> {
    std::iter::once(supervisor())
        .chain(SPECIALISTS.iter().map(from_row))
        .chain([marketing(), seo()])
        .chain(LATE_SPECIALISTS.iter().map(from_row))
        .collect()
}

/// Registry over [`default_agents`]
pub fn default_roster() -> AgentRoster {
    AgentRoster::new(default_agents())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use orchestra_core::{AgentRegistry, DispatchClient};

    use super::*;
    use crate::{CredentialVault, ProviderRegistry};

    #[test]
    fn test_roster_ids_unique_and_complete() {
        let agents = default_agents();
        let ids: HashSet<_> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), agents.len());
        assert_eq!(default_roster().len(), 39);
        assert_eq!(agents[0].id, SUPERVISOR_AGENT_ID);
        assert_eq!(agents.last().unwrap().id, "human-owner");
    }

    #[test]
    fn test_tool_bearing_agents() {
        let roster = default_roster();
        let tools = |id: &str| {
            roster
                .find_by_id(id)
                .unwrap()
                .tools
                .iter()
                .map(|t| (t.name.clone(), t.provider.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(tools(SUPERVISOR_AGENT_ID), [(DELEGATE_FUNCTION.to_owned(), ORCHESTRA_PROVIDER.to_owned())]);
        assert_eq!(tools("marketing-agent"), [("post_instagram_video".to_owned(), "instagram".to_owned())]);
        assert_eq!(tools("seo-agent"), [("get_seo_report".to_owned(), "seo_perf".to_owned())]);
        assert!(tools("code-agent").is_empty());
    }

    #[test]
    fn test_declarations_match_declared_tools() {
        let executor = Arc::new(ProviderRegistry::new(CredentialVault::in_memory()));
        for agent in default_roster().all() {
            let declared: Vec<_> = agent.tools.iter().map(|t| t.name.clone()).collect();
            let client = DispatchClient::new(agent.clone(), executor.clone());
            let names: Vec<_> = client
                .list_tool_declarations()
                .into_iter()
                .map(|d| d.name)
                .collect();
            assert_eq!(names, declared, "{}", agent.id);
        }
    }

    #[test]
    fn test_every_category_but_iaas_is_staffed() {
        let roster = default_roster();
        for category in Category::ALL {
            let staffed = !roster.filter(Some(category), None).is_empty();
            assert_eq!(staffed, category != Category::Iaas, "{category}");
        }
    }
}
