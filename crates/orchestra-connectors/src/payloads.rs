//! Simulated Provider Payloads
//!
//! For testing and demo purposes. Each provider has one generator that may
//! branch on the tool name; providers without a generator get a generic echo.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use serde_json::{Value, json};

/// Builds a payload from `(tool_name, args)`
pub type PayloadFn = fn(&str, &Value) -> Value;

/// Provider id to payload generator
#[derive(Clone, Debug)]
pub struct PayloadMap {
    generators: HashMap<&'static str, PayloadFn>,
}

impl Default for PayloadMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PayloadMap {
    /// No generators; every provider gets the generic payload
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Generators for every bundled provider
    pub fn builtin() -> Self {
        let entries: [(&'static str, PayloadFn); 15] = [
            ("jira", jira),
            ("miro", miro),
            ("seo_perf", seo_perf),
            ("grafana", grafana),
            ("figma", figma),
            ("slack", slack),
            ("postgres", postgres),
            ("aws", aws),
            ("stripe", stripe),
            ("google_search", google_search),
            ("meta", social_activity),
            ("linkedin", social_activity),
            ("instagram", instagram),
            ("github", github),
            ("playwright", playwright),
        ];
        Self {
            generators: entries.into_iter().collect(),
        }
    }

    /// Register or replace a generator
    #[must_use]
    pub fn with(mut self, provider_id: &'static str, generator: PayloadFn) -> Self {
        self.generators.insert(provider_id, generator);
        self
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.generators.contains_key(provider_id)
    }

    /// Payload for `tool_name` on `provider_id`
    pub fn generate(&self, provider_id: &str, tool_name: &str, args: &Value) -> Value {
        self.generators
            .get(provider_id)
            .map_or_else(|| generic(args), |generate| generate(tool_name, args))
    }
}

fn generic(args: &Value) -> Value {
    json!({ "status": "executed", "data": args })
}

fn random_below(upper: u32) -> u32 {
    rand::rng().random_range(0..upper)
}

fn arg_or<'a>(args: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
}

fn jira(tool: &str, _args: &Value) -> Value {
    if tool == "create_backlog_item" {
        let ticket = format!("KLOUD-{}", random_below(9000));
        json!({
            "ticket_id": ticket,
            "status": "TO DO",
            "assignee": "UNASSIGNED",
            "url": format!("https://jira.kloud.io/browse/{ticket}"),
        })
    } else {
        json!({
            "sprint_name": "Orchestra Alpha",
            "velocity": 45,
            "completion_rate": "88%",
            "blockers": 2,
        })
    }
}

fn miro(tool: &str, args: &Value) -> Value {
    if tool == "create_miro_sticky" {
        json!({
            "item_id": format!("MIRO-{}", random_below(10_000)),
            "content": args.get("content").cloned().unwrap_or(Value::Null),
            "status": "CREATED",
        })
    } else {
        json!({
            "board_id": arg_or(args, "board_id", "B-992"),
            "widgets": 24,
            "last_modified": "12m ago",
        })
    }
}

fn seo_perf(tool: &str, _args: &Value) -> Value {
    let anomalies: &[&str] = if tool == "analyze_keywords" {
        &["Keyword cannibalization detected on /pricing"]
    } else {
        &[]
    };
    json!({
        "lighthouse_performance": 92,
        "seo_score": 88,
        "first_contentful_paint": "1.2s",
        "top_keyword_rank": 4,
        "anomalies": anomalies,
    })
}

fn grafana(tool: &str, _args: &Value) -> Value {
    let incidents = if tool == "list_active_incidents" {
        json!([{ "id": "INC-102", "severity": "P2", "title": "High Memory on Node-4" }])
    } else {
        json!([])
    };
    json!({
        "p99_latency": "124ms",
        "error_rate": "0.02%",
        "active_pods": 24,
        "health_status": "HEALTHY",
        "active_incidents": incidents,
    })
}

fn figma(_tool: &str, _args: &Value) -> Value {
    json!({
        "tokens": { "primary": "#9d5ce9", "secondary": "#050214", "corner_radius": "1.5rem" },
        "audit_score": 94,
        "accessibility_violations": 0,
    })
}

fn slack(_tool: &str, args: &Value) -> Value {
    json!({
        "status": "message_delivered",
        "channel": arg_or(args, "channel", "#ops-center"),
        "ts": Utc::now().timestamp_millis(),
    })
}

fn postgres(_tool: &str, _args: &Value) -> Value {
    json!({
        "row_count": 1_450_230,
        "anomalies": 0,
        "last_vacuum": "2 hours ago",
        "scan_result": "CLEAN",
    })
}

fn aws(tool: &str, _args: &Value) -> Value {
    if tool == "get_aws_spend" {
        json!({ "amount": "$1,245.20", "period": "MTD", "forecast": "$1,800.00" })
    } else {
        json!({ "buckets": ["prod-assets", "backup-vault"], "encryption": "AES-256" })
    }
}

fn stripe(_tool: &str, _args: &Value) -> Value {
    json!({ "volume": "$42,500.00", "subscriptions": 154, "churn": "2.4%" })
}

fn google_search(_tool: &str, _args: &Value) -> Value {
    json!({
        "top_results": [
            {
                "title": "State of Cloud 2024",
                "snippet": "Autonomous agents are projected to drive 40% of delivery...",
                "link": "https://gartner.com",
            },
            {
                "title": "Competitor Moat Analysis",
                "snippet": "Key competitors are lacking integrated MCP protocols...",
                "link": "https://analyst.io",
            },
        ]
    })
}

fn social_activity(_tool: &str, _args: &Value) -> Value {
    json!({
        "status": "published",
        "activity_id": format!("ACT_{}", Utc::now().timestamp_millis()),
    })
}

fn instagram(tool: &str, args: &Value) -> Value {
    if tool != "post_instagram_video" {
        return json!({});
    }
    json!({
        "status": "success",
        "media_id": format!("IG_VIDEO_{}", random_below(1_000_000)),
        "permalink": "https://instagram.com/p/mock-video-id",
        "caption_delivered": args.get("caption").cloned().unwrap_or(Value::Null),
    })
}

fn github(_tool: &str, _args: &Value) -> Value {
    json!({ "pr_id": 42, "url": "https://github.com/kloud/pull/42", "status": "OPEN" })
}

fn playwright(_tool: &str, _args: &Value) -> Value {
    json!({ "status": "passed", "total": 12, "failures": 0, "duration": "4.2s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jira_branches_on_tool() {
        let map = PayloadMap::builtin();
        let ticket = map.generate("jira", "create_backlog_item", &json!({}));
        let id = ticket["ticket_id"].as_str().unwrap();
        assert!(id.starts_with("KLOUD-"));
        assert!(id[6..].parse::<u32>().unwrap() < 9000);

        let sprint = map.generate("jira", "get_sprint_status", &json!({}));
        assert_eq!(sprint["velocity"], 45);
    }

    #[test]
    fn test_instagram_echoes_caption() {
        let payload = PayloadMap::builtin().generate(
            "instagram",
            "post_instagram_video",
            &json!({"video_url": "https://cdn/x.mp4", "caption": "Launch day"}),
        );
        assert_eq!(payload["caption_delivered"], "Launch day");
        assert!(payload["media_id"].as_str().unwrap().starts_with("IG_VIDEO_"));
    }

    #[test]
    fn test_defaults_from_args() {
        let map = PayloadMap::builtin();
        assert_eq!(map.generate("slack", "post", &json!({}))["channel"], "#ops-center");
        assert_eq!(map.generate("slack", "post", &json!({"channel": "#eng"}))["channel"], "#eng");
        assert_eq!(map.generate("miro", "read_board", &json!({}))["board_id"], "B-992");
        assert_eq!(
            map.generate("grafana", "list_active_incidents", &json!({}))["active_incidents"][0]["id"],
            "INC-102"
        );
    }

    #[test]
    fn test_unknown_provider_is_generic() {
        let args = json!({"x": 1});
        let payload = PayloadMap::builtin().generate("datadog", "query", &args);
        assert_eq!(payload, json!({"status": "executed", "data": {"x": 1}}));
        assert!(!PayloadMap::empty().contains("jira"));
    }
}
