//! Level-up announcement rendering via `minijinja`.
//!
//! The built-in template reproduces the classic message. Operators can point
//! `announcements.template_path` at their own file to change the wording
//! without recompiling. Templates see `name`, `level`, `levels_gained`,
//! `reward`, `bonus`, `total`, and `lifetime_xp`.
//!
//! Replies to the owner `givexp` command are fixed text.

use std::path::Path;

use minijinja::{Environment, context};
use popcorn_progression::{LevelUp, total_experience_for};
use popcorn_types::MemberId;

use crate::error::BotError;

/// Reply when a grant names a member with no record.
pub const GRANT_UNKNOWN_MEMBER: &str = "Unable to find that user in my database.";

/// Template used when no override is configured.
const DEFAULT_LEVEL_UP_TEMPLATE: &str = include_str!("../templates/level_up.j2");

/// Renders user-facing level-up messages.
pub struct Announcer {
    env: Environment<'static>,
}

impl Announcer {
    /// Create an announcer, loading the level-up template from `path` if
    /// given, otherwise using the built-in one.
    pub fn new(path: Option<&Path>) -> Result<Self, BotError> {
        let source = match path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                BotError::Template(format!(
                    "failed to read template {}: {e}",
                    path.display()
                ))
            })?,
            None => DEFAULT_LEVEL_UP_TEMPLATE.to_owned(),
        };
        Self::from_source(source)
    }

    /// Create an announcer from template source text.
    pub fn from_source(source: String) -> Result<Self, BotError> {
        let mut env = Environment::new();
        env.add_template_owned("level_up", source)
            .map_err(|e| BotError::Template(format!("failed to add level_up template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the announcement for `display_name` reaching a new level.
    pub fn level_up(&self, display_name: &str, level_up: &LevelUp) -> Result<String, BotError> {
        self.env
            .get_template("level_up")
            .map_err(|e| BotError::Template(format!("missing level_up template: {e}")))?
            .render(context! {
                name => display_name,
                level => level_up.new_level,
                levels_gained => level_up.levels_gained,
                reward => level_up.reward,
                bonus => level_up.bonus,
                total => level_up.total_credit(),
                lifetime_xp => total_experience_for(level_up.new_level)
                    .saturating_add(level_up.record.experience),
            })
            .map_err(|e| BotError::Template(format!("level_up render failed: {e}")))
    }
}

/// Reply confirming a `givexp` grant.
pub fn grant_applied(member: &MemberId, amount: u64, experience: u64) -> String {
    format!("Gave {amount} xp to <@{member}>. They now have {experience} xp toward the next level.")
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer").finish_non_exhaustive()
    }
}
