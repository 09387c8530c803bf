//! Directory initialization spec.
//!
//! Parsed from `INIT_DIRS` (a colon-separated path list) and `INIT_OWNER`
//! (`user` or `user:group`). The entrypoint creates every listed directory
//! once at startup and, when an owner is present, hands ownership over
//! recursively.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::CoreError;

/// Separator used by `INIT_DIRS`.
pub const PATH_LIST_SEPARATOR: char = ':';

/// Owner for recursive `chown`, e.g. `mysql` or `mysql:mysql`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSpec {
    pub user: String,
    pub group: Option<String>,
}

impl FromStr for OwnerSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (user, group) = match s.split_once(':') {
            Some((user, group)) => (user, Some(group)),
            None => (s, None),
        };

        if user.is_empty() || group.is_some_and(|g| g.is_empty() || g.contains(':')) {
            return Err(CoreError::InvalidOwner(s.to_string()));
        }

        Ok(Self {
            user: user.to_string(),
            group: group.map(str::to_string),
        })
    }
}

impl fmt::Display for OwnerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}:{group}", self.user),
            None => write!(f, "{}", self.user),
        }
    }
}

/// Ordered set of directories to create, plus an optional owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySpec {
    pub paths: Vec<PathBuf>,
    pub owner: Option<OwnerSpec>,
}

impl DirectorySpec {
    /// Build a spec from the raw `INIT_DIRS` list and an already-parsed owner.
    ///
    /// Empty segments (`a::b`, trailing `:`) are dropped and duplicates keep
    /// their first position.
    pub fn parse(list: &str, owner: Option<OwnerSpec>) -> Self {
        let mut paths: Vec<PathBuf> = Vec::new();
        for segment in list.split(PATH_LIST_SEPARATOR).map(str::trim) {
            if segment.is_empty() {
                continue;
            }
            let path = PathBuf::from(segment);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        Self { paths, owner }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn owner_user_only() {
        let owner: OwnerSpec = "mysql".parse().expect("parse");
        assert_eq!(owner.user, "mysql");
        assert_eq!(owner.group, None);
        assert_eq!(owner.to_string(), "mysql");
    }

    #[test]
    fn owner_user_and_group() {
        let owner: OwnerSpec = "999:adm".parse().expect("parse");
        assert_eq!(owner.user, "999");
        assert_eq!(owner.group.as_deref(), Some("adm"));
        assert_eq!(owner.to_string(), "999:adm");
    }

    #[test]
    fn owner_rejects_malformed() {
        for raw in ["", ":adm", "mysql:", "a:b:c"] {
            assert_matches!(
                raw.parse::<OwnerSpec>(),
                Err(CoreError::InvalidOwner(_)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_drops_empty_segments() {
        let spec = DirectorySpec::parse(":/var/lib/mysql::/run/mysqld:", None);
        assert_eq!(
            spec.paths,
            vec![PathBuf::from("/var/lib/mysql"), PathBuf::from("/run/mysqld")]
        );
    }

    #[test]
    fn parse_keeps_order_and_dedupes() {
        let spec = DirectorySpec::parse("/b:/a:/b", None);
        assert_eq!(spec.paths, vec![PathBuf::from("/b"), PathBuf::from("/a")]);
    }

    #[test]
    fn parse_empty_list() {
        assert!(DirectorySpec::parse("", None).is_empty());
    }
}
