use serde::{Deserialize, Serialize};

/// One external command to spawn. `spawn[0]` is the program, the rest are
/// argument templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub spawn: Vec<String>,
}

impl HookConfig {
    pub fn new<I, S>(spawn: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            spawn: spawn.into_iter().map(Into::into).collect(),
        }
    }
}

/// Hooks grouped by the event that triggers them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Run once for every entry successfully delivered.
    #[serde(default)]
    pub new_article: Vec<HookConfig>,
}
