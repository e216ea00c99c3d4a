//! Store configuration.

use crate::error::{CoreError, CoreResult};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// A named store option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppOption {
    /// Let reads match records written by other author identities.
    AcceptDataFromOtherUsers,
}

impl AppOption {
    /// Every option, in declaration order.
    pub const ALL: [Self; 1] = [Self::AcceptDataFromOtherUsers];

    /// Returns the option's string name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AcceptDataFromOtherUsers => "accept-data-from-other-users",
        }
    }
}

impl fmt::Display for AppOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AppOption {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|opt| opt.name() == s)
            .ok_or_else(|| CoreError::unknown_option(s))
    }
}

/// When a successful `set` also compacts the key's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionPolicy {
    /// Compact after roughly one write in `one_in`. Zero never compacts.
    Sampled {
        /// Inverse trigger probability.
        one_in: u32,
    },
    /// Compact after every write.
    Always,
    /// Never compact on write.
    Never,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self::Sampled { one_in: 10 }
    }
}

impl CompactionPolicy {
    /// Draws whether this write should compact.
    #[must_use]
    pub fn should_compact(&self) -> bool {
        match *self {
            Self::Sampled { one_in: 0 } | Self::Never => false,
            Self::Sampled { one_in } => rand::thread_rng().gen_ratio(1, one_in),
            Self::Always => true,
        }
    }
}

/// Configuration for opening a store.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Whether reads match records written by other author identities.
    pub accept_data_from_other_users: bool,

    /// Compaction after writes.
    pub compaction: CompactionPolicy,
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether reads accept other authors' records.
    #[must_use]
    pub const fn accept_data_from_other_users(mut self, value: bool) -> Self {
        self.accept_data_from_other_users = value;
        self
    }

    /// Sets the compaction policy.
    #[must_use]
    pub const fn compaction(mut self, policy: CompactionPolicy) -> Self {
        self.compaction = policy;
        self
    }

    /// Applies a named option.
    #[must_use]
    pub const fn option(self, option: AppOption) -> Self {
        match option {
            AppOption::AcceptDataFromOtherUsers => self.accept_data_from_other_users(true),
        }
    }

    /// Applies option names, rejecting any that is not recognized.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownOption`] for the first unknown name.
    pub fn options<I, S>(self, names: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(self, |config, name| {
            Ok(config.option(name.as_ref().parse()?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.accept_data_from_other_users);
        assert_eq!(config.compaction, CompactionPolicy::Sampled { one_in: 10 });
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .accept_data_from_other_users(true)
            .compaction(CompactionPolicy::Never);

        assert!(config.accept_data_from_other_users);
        assert_eq!(config.compaction, CompactionPolicy::Never);
    }

    #[test]
    fn option_names_parse() {
        let opt: AppOption = "accept-data-from-other-users".parse().unwrap();
        assert_eq!(opt, AppOption::AcceptDataFromOtherUsers);
        assert_eq!(opt.to_string(), "accept-data-from-other-users");

        let err = "frobnicate".parse::<AppOption>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownOption { name } if name == "frobnicate"));
    }

    #[test]
    fn options_applied_eagerly() {
        let config = Config::new()
            .options(["accept-data-from-other-users"])
            .unwrap();
        assert!(config.accept_data_from_other_users);

        let result = Config::new().options(["accept-data-from-other-users", "bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn fixed_policies() {
        assert!(CompactionPolicy::Always.should_compact());
        assert!(!CompactionPolicy::Never.should_compact());
        assert!(!CompactionPolicy::Sampled { one_in: 0 }.should_compact());
        assert!(CompactionPolicy::Sampled { one_in: 1 }.should_compact());
    }

    #[test]
    fn sampled_policy_fires_sometimes() {
        let policy = CompactionPolicy::default();
        let hits = (0..2000).filter(|_| policy.should_compact()).count();
        // Expected about 200.
        assert!(hits > 50 && hits < 500, "hits = {hits}");
    }
}
