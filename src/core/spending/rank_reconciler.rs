// Works out which rank roles a member should gain or lose after a spend.
//
// Only computes the delta. Applying it is the service's job.

use super::rank_table::RankTable;

/// Rank-role changes needed to converge a member on a single rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDelta {
    /// Rank the member should hold, if they don't already.
    pub to_add: Option<String>,
    /// Other rank roles the member currently holds.
    pub to_remove: Vec<String>,
}

impl RoleDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_none() && self.to_remove.is_empty()
    }
}

/// Compare the rank earned by `new_total` against the member's role names.
///
/// Below every threshold nothing changes: members are never demoted to "no rank".
/// Roles that aren't ranks (reaction roles, staff roles...) are never touched.
pub fn reconcile<S: AsRef<str>>(table: &RankTable, new_total: u64, current_roles: &[S]) -> RoleDelta {
    let Some(target) = table.rank_for(new_total) else {
        return RoleDelta::default();
    };

    let holds = |name: &str| current_roles.iter().any(|r| r.as_ref() == name);

    let to_add = (!holds(&target.name)).then(|| target.name.clone());
    let to_remove = table
        .ranks()
        .iter()
        .filter(|rank| rank.name != target.name && holds(&rank.name))
        .map(|rank| rank.name.clone())
        .collect();

    RoleDelta { to_add, to_remove }
}
