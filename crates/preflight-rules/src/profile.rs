use preflight_core::{Rule, RuleSet, Severity};

pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const SECRET_KEYS: [&str; 3] = ["DB_PASSWORD", "JWT_SECRET", "ENCRYPTION_KEY"];

pub const PROFILES: [&str; 2] = ["deploy", "secrets"];

/// Built-in profile -> rule set. Unknown names yield None.
pub fn rule_set_for_profile(profile: &str) -> Option<RuleSet> {
    match profile {
        "deploy" => Some(deploy_rule_set()),
        "secrets" => Some(RuleSet::new(secret_rules())),
        _ => None,
    }
}

fn secret_rules() -> Vec<Rule> {
    SECRET_KEYS
        .iter()
        .map(|key| {
            Rule::key_present(key.to_ascii_lowercase().replace('_', "-"), *key, Severity::Blocking)
                .with_hint(format!("Set {} in .env to a real value (not a placeholder)", key))
        })
        .collect()
}

/// Secrets, compose file, audit logging (blocking); retention and timezone
/// (warning).
pub fn deploy_rule_set() -> RuleSet {
    let mut rules = secret_rules();
    rules.push(
        Rule::file_exists("compose-file", COMPOSE_FILE, Severity::Blocking)
            .with_hint(format!("Create {} in the deployment directory", COMPOSE_FILE)),
    );
    rules.push(
        Rule::pattern_in_file(
            "audit-logging",
            COMPOSE_FILE,
            "AUDIT_LOG_ENABLED=true",
            Severity::Blocking,
        )
        .with_hint("Add AUDIT_LOG_ENABLED=true to the backend service environment"),
    );
    rules.push(
        Rule::pattern_in_file(
            "data-retention",
            COMPOSE_FILE,
            "DATA_RETENTION_DAYS=",
            Severity::Warning,
        )
        .with_hint("Declare DATA_RETENTION_DAYS for the backend service"),
    );
    rules.push(
        Rule::pattern_in_file("timezone", COMPOSE_FILE, "TZ=Europe/Luxembourg", Severity::Warning)
            .with_hint("Set TZ=Europe/Luxembourg on every service"),
    );
    RuleSet::new(rules)
}
