use preflight_core::{classify_value, PlaceholderPolicy, Rule, RuleKind, RuleTarget, ValueState};
use preflight_env::Environment;

/// Pass/fail plus the message that ends up in the Finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self { passed: true, message: message.into() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { passed: false, message: message.into() }
    }
}

/// Evaluates one rule kind. Implementations only read the environment.
pub trait Check: Send + Sync {
    fn kind(&self) -> RuleKind;
    fn eval(
        &self,
        rule: &Rule,
        placeholder: &PlaceholderPolicy,
        env: &dyn Environment,
    ) -> CheckOutcome;
}

pub struct KeyPresentCheck;
pub struct FileExistsCheck;
pub struct PatternInFileCheck;
pub struct PatternAbsentInFileCheck;

pub fn check_for(kind: RuleKind) -> &'static dyn Check {
    match kind {
        RuleKind::KeyPresent => &KeyPresentCheck,
        RuleKind::FileExists => &FileExistsCheck,
        RuleKind::PatternInFile => &PatternInFileCheck,
        RuleKind::PatternAbsentInFile => &PatternAbsentInFileCheck,
    }
}

/// Unchecked rule sets can pair a kind with the wrong target.
fn mismatch(rule: &Rule) -> CheckOutcome {
    let target = rule.target.describe();
    CheckOutcome::fail(format!("target {:?} does not fit kind {}", target, rule.kind))
}

impl Check for KeyPresentCheck {
    fn kind(&self) -> RuleKind {
        RuleKind::KeyPresent
    }

    fn eval(
        &self,
        rule: &Rule,
        placeholder: &PlaceholderPolicy,
        env: &dyn Environment,
    ) -> CheckOutcome {
        let RuleTarget::Key { key } = &rule.target else {
            return mismatch(rule);
        };
        // never echo the value itself
        match classify_value(env.get(key).as_deref(), placeholder) {
            ValueState::Set => CheckOutcome::pass(format!("{} is set", key)),
            ValueState::Absent => CheckOutcome::fail(format!("{} is not set", key)),
            ValueState::Empty => CheckOutcome::fail(format!("{} is empty", key)),
            ValueState::Placeholder => {
                CheckOutcome::fail(format!("{} still holds a placeholder value", key))
            }
        }
    }
}

impl Check for FileExistsCheck {
    fn kind(&self) -> RuleKind {
        RuleKind::FileExists
    }

    fn eval(
        &self,
        rule: &Rule,
        _placeholder: &PlaceholderPolicy,
        env: &dyn Environment,
    ) -> CheckOutcome {
        let RuleTarget::File { path } = &rule.target else {
            return mismatch(rule);
        };
        match env.file_exists(path) {
            Ok(true) => CheckOutcome::pass(format!("{} exists", path)),
            Ok(false) => CheckOutcome::fail(format!("{} not found", path)),
            Err(e) => CheckOutcome::fail(format!("cannot access {}: {}", path, e)),
        }
    }
}

enum FileContent {
    Missing,
    Contains(bool),
    Unreadable(String),
}

fn scan(env: &dyn Environment, path: &str, pattern: &str) -> FileContent {
    match env.file_exists(path) {
        Ok(false) => return FileContent::Missing,
        Err(e) => return FileContent::Unreadable(e.to_string()),
        Ok(true) => {}
    }
    match env.read_to_string(path) {
        Ok(content) => FileContent::Contains(content.contains(pattern)),
        Err(e) => FileContent::Unreadable(e.to_string()),
    }
}

impl Check for PatternInFileCheck {
    fn kind(&self) -> RuleKind {
        RuleKind::PatternInFile
    }

    fn eval(
        &self,
        rule: &Rule,
        _placeholder: &PlaceholderPolicy,
        env: &dyn Environment,
    ) -> CheckOutcome {
        let RuleTarget::FilePattern { path, pattern } = &rule.target else {
            return mismatch(rule);
        };
        match scan(env, path, pattern) {
            FileContent::Contains(true) => {
                CheckOutcome::pass(format!("{} contains {:?}", path, pattern))
            }
            FileContent::Contains(false) => {
                CheckOutcome::fail(format!("{} does not contain {:?}", path, pattern))
            }
            FileContent::Missing => CheckOutcome::fail(format!("{} not found", path)),
            FileContent::Unreadable(e) => {
                CheckOutcome::fail(format!("cannot read {}: {}", path, e))
            }
        }
    }
}

impl Check for PatternAbsentInFileCheck {
    fn kind(&self) -> RuleKind {
        RuleKind::PatternAbsentInFile
    }

    fn eval(
        &self,
        rule: &Rule,
        _placeholder: &PlaceholderPolicy,
        env: &dyn Environment,
    ) -> CheckOutcome {
        let RuleTarget::FilePattern { path, pattern } = &rule.target else {
            return mismatch(rule);
        };
        match scan(env, path, pattern) {
            FileContent::Contains(true) => {
                CheckOutcome::fail(format!("{} still contains {:?}", path, pattern))
            }
            FileContent::Contains(false) => {
                CheckOutcome::pass(format!("{} does not contain {:?}", path, pattern))
            }
            FileContent::Missing => {
                CheckOutcome::pass(format!("{} not found; nothing to flag", path))
            }
            FileContent::Unreadable(e) => {
                CheckOutcome::fail(format!("cannot read {}: {}", path, e))
            }
        }
    }
}
