//! Voice Command Routing
//!
//! Turns a final speech transcript into an action on the roster. Audio capture
//! and synthesis live outside this crate; only text comes in.

use std::sync::{Arc, LazyLock, Mutex};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::agent::{Agent, AgentRegistry};

/// Words that open a voice conversation
pub const WAKE_WORDS: [&str; 6] = ["hey", "hi", "system", "conductor", "orchestra", "okay"];

/// How long a conversation stays open after the last routed utterance
pub const CONVERSATION_WINDOW: Duration = Duration::from_secs(15);

static NAVIGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(i want to use|use|switch to|talk to|open|select|activate|show|call)\s+(.+)")
        .expect("navigation pattern is valid")
});

/// Routed meaning of one utterance
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Not addressed to the orchestra
    Ignored,
    /// Bare wake word; the caller should prompt for a command
    Listen,
    /// Make this agent the selected one
    Select(Arc<Agent>),
    /// Run `task` on `agent`
    Execute { agent: Arc<Agent>, task: String },
}

/// Tracks whether a voice conversation is open
#[derive(Debug)]
pub struct VoiceRouter {
    window: Duration,
    open_until: Mutex<Option<Instant>>,
}

impl Default for VoiceRouter {
    fn default() -> Self {
        Self::new(CONVERSATION_WINDOW)
    }
}

impl VoiceRouter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            open_until: Mutex::new(None),
        }
    }

    pub fn is_conversing(&self) -> bool {
        self.open_until
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some_and(|until| Instant::now() < until)
    }

    /// Route a final transcript.
    ///
    /// `selected` is the agent currently selected in the session, used when
    /// the utterance names no agent.
    pub fn route(
        &self,
        transcript: &str,
        agents: &dyn AgentRegistry,
        selected: Option<Arc<Agent>>,
    ) -> VoiceCommand {
        let transcript = transcript.trim().to_lowercase();
        let conversing = self.is_conversing();
        let wake = starts_with_wake_word(&transcript);

        if !wake && !conversing {
            return VoiceCommand::Ignored;
        }

        *self
            .open_until
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Instant::now() + self.window);

        let command = if wake && !conversing {
            let rest = transcript
                .split_once(char::is_whitespace)
                .map_or("", |(_, rest)| rest.trim());
            if rest.is_empty() {
                return VoiceCommand::Listen;
            }
            rest.to_owned()
        } else {
            transcript
        };

        route_command(&command, agents, selected)
    }
}

fn starts_with_wake_word(transcript: &str) -> bool {
    transcript
        .split_whitespace()
        .next()
        .map(|w| w.trim_end_matches(|c: char| c.is_ascii_punctuation()))
        .is_some_and(|w| WAKE_WORDS.contains(&w))
}

/// Route a command that is already known to address the orchestra
pub fn route_command(
    command: &str,
    agents: &dyn AgentRegistry,
    selected: Option<Arc<Agent>>,
) -> VoiceCommand {
    let command = command.trim();
    let roster = agents.all();

    if let Some(caps) = NAVIGATION.captures(command) {
        let requested = caps[2].trim().to_lowercase();
        if let Some(target) = roster
            .iter()
            .find(|a| a.name.to_lowercase().contains(&requested))
        {
            tracing::debug!(agent = %target.id, "voice selected agent");
            return VoiceCommand::Select(target.clone());
        }
    }

    let normalized = command.to_lowercase().replacen('&', "and", 1);
    for agent in &roster {
        let name = agent.name.to_lowercase().replacen('&', "and", 1);
        let Some(rest) = normalized.strip_prefix(&name) else {
            continue;
        };
        let task = rest
            .trim_start_matches(|c: char| c == ',' || c == ':' || c.is_whitespace())
            .trim();
        if task.len() > 2 {
            tracing::debug!(agent = %agent.id, "voice addressed agent directly");
            return VoiceCommand::Execute {
                agent: agent.clone(),
                task: task.to_owned(),
            };
        }
    }

    if command.len() > 3 {
        if let Some(agent) = selected.or_else(|| agents.default_agent()) {
            return VoiceCommand::Execute {
                agent,
                task: command.to_owned(),
            };
        }
    }

    VoiceCommand::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentRoster, Category, SUPERVISOR_AGENT_ID};

    fn roster() -> AgentRoster {
        AgentRoster::new([
            Agent::new(SUPERVISOR_AGENT_ID, "The Conductor", "Chief Orchestra Supervisor", Category::Orchestration),
            Agent::new("seo-agent", "Growth & SEO", "SEO Architect", Category::Marketing),
            Agent::new("code-agent", "Code Agent", "Lead Developer", Category::Engineering),
        ])
    }

    fn executed(cmd: &VoiceCommand) -> Option<(&str, &str)> {
        match cmd {
            VoiceCommand::Execute { agent, task } => Some((agent.id.as_str(), task.as_str())),
            _ => None,
        }
    }

    #[test]
    fn test_ignored_without_wake_word() {
        let router = VoiceRouter::default();
        assert_eq!(router.route("code agent, fix it", &roster(), None), VoiceCommand::Ignored);
        assert_eq!(router.route("history of rome", &roster(), None), VoiceCommand::Ignored);
        assert!(!router.is_conversing());
    }

    #[test]
    fn test_bare_wake_word_listens_then_conversation_stays_open() {
        let router = VoiceRouter::default();
        assert_eq!(router.route("Hey", &roster(), None), VoiceCommand::Listen);
        assert!(router.is_conversing());

        let cmd = router.route("code agent, refactor the cache", &roster(), None);
        assert_eq!(executed(&cmd), Some(("code-agent", "refactor the cache")));
    }

    #[test]
    fn test_navigation_selects_agent() {
        let router = VoiceRouter::default();
        match router.route("okay switch to code", &roster(), None) {
            VoiceCommand::Select(agent) => assert_eq!(agent.id, "code-agent"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_direct_address_reads_ampersand_as_and() {
        let cmd = route_command("growth and seo: audit the pricing page", &roster(), None);
        assert_eq!(executed(&cmd), Some(("seo-agent", "audit the pricing page")));

        // Task too short falls through to the default agent with the whole command
        let cmd = route_command("code agent, go", &roster(), None);
        assert_eq!(executed(&cmd), Some((SUPERVISOR_AGENT_ID, "code agent, go")));
    }

    #[test]
    fn test_fallback_prefers_selected_agent() {
        let roster = roster();
        let selected = roster.find_by_id("seo-agent");
        let cmd = route_command("summarize yesterday", &roster, selected);
        assert_eq!(executed(&cmd), Some(("seo-agent", "summarize yesterday")));

        assert_eq!(route_command("ok", &roster, None), VoiceCommand::Ignored);
    }

    #[test]
    fn test_expired_window_requires_wake_word() {
        let router = VoiceRouter::new(Duration::ZERO);
        assert_eq!(router.route("hi", &roster(), None), VoiceCommand::Listen);
        assert_eq!(router.route("code agent, ship it", &roster(), None), VoiceCommand::Ignored);
    }
}
