//! Process roles
//!
//! Every component is constructed with an explicit `Role` instead of
//! inferring it from ambient state.

use crate::JoinerIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role this process plays in a match session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The single process running the authoritative simulation
    Host,
    /// A connected non-host process
    Joiner(JoinerIndex),
}

impl Role {
    /// Check if this is the host role
    pub fn is_host(&self) -> bool {
        matches!(self, Role::Host)
    }

    /// Get the joiner index, if this is a joiner
    pub fn joiner_index(&self) -> Option<JoinerIndex> {
        match self {
            Role::Host => None,
            Role::Joiner(index) => Some(*index),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Joiner(index) => write!(f, "{}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role() {
        assert!(Role::Host.is_host());
        assert_eq!(Role::Host.joiner_index(), None);
        assert_eq!(format!("{}", Role::Host), "host");

        let joiner = Role::Joiner(JoinerIndex::new(2));
        assert!(!joiner.is_host());
        assert_eq!(joiner.joiner_index(), Some(JoinerIndex::new(2)));
        assert_eq!(format!("{}", joiner), "joiner:2");
    }
}
