//! Communication-group partition.
//!
//! Groups bound the blast radius of a failing bus transaction: each group
//! maps to one sync read/write on the wire, addressing only the IDs that
//! share a bus segment. Group order and member order are frozen at build
//! time, so two runs with the same configuration process the chain in the
//! same order.

use crate::registry::ActuatorRegistry;
use std::collections::HashMap;

/// One communication group: a name and its member IDs in first-seen order.
/// Member order defines the on-wire batch order for the group's
/// transactions.
#[derive(Debug, Clone)]
pub struct CommGroup {
    /// Group name from configuration
    pub name: String,
    /// Member bus IDs, first-seen order
    pub member_ids: Vec<u8>,
}

/// The full partition: groups in first-seen order plus an id→group index.
#[derive(Debug, Default)]
pub struct GroupPlan {
    groups: Vec<CommGroup>,
    by_id: HashMap<u8, usize>,
}

impl GroupPlan {
    /// Partition the registry's actuators by group name.
    pub fn build(registry: &ActuatorRegistry) -> Self {
        let mut groups: Vec<CommGroup> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut by_id = HashMap::new();

        for record in registry.records() {
            let gi = match index.get(record.group.as_str()) {
                Some(&gi) => gi,
                None => {
                    let gi = groups.len();
                    groups.push(CommGroup {
                        name: record.group.clone(),
                        member_ids: Vec::new(),
                    });
                    index.insert(record.group.as_str(), gi);
                    gi
                }
            };
            groups[gi].member_ids.push(record.id);
            by_id.insert(record.id, gi);
        }

        Self { groups, by_id }
    }

    /// All groups, in first-seen order.
    pub fn groups(&self) -> &[CommGroup] {
        &self.groups
    }

    /// The group one actuator belongs to.
    pub fn group_of(&self, id: u8) -> Option<&str> {
        self.by_id.get(&id).map(|&gi| self.groups[gi].name.as_str())
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the plan has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActuatorRecord;

    fn registry(entries: &[(u8, &str)]) -> ActuatorRegistry {
        let mut registry = ActuatorRegistry::new();
        for &(id, group) in entries {
            registry
                .register(ActuatorRecord {
                    id,
                    group: group.to_string(),
                    settings: Vec::new(),
                })
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_partition_first_seen_order() {
        let registry = registry(&[(1, "A"), (2, "B"), (3, "A")]);
        let plan = GroupPlan::build(&registry);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.groups()[0].name, "A");
        assert_eq!(plan.groups()[0].member_ids, vec![1, 3]);
        assert_eq!(plan.groups()[1].name, "B");
        assert_eq!(plan.groups()[1].member_ids, vec![2]);
    }

    #[test]
    fn test_group_of() {
        let registry = registry(&[(1, "A"), (2, "B"), (3, "A")]);
        let plan = GroupPlan::build(&registry);

        assert_eq!(plan.group_of(1), Some("A"));
        assert_eq!(plan.group_of(2), Some("B"));
        assert_eq!(plan.group_of(3), Some("A"));
        assert_eq!(plan.group_of(4), None);
    }

    #[test]
    fn test_partition_is_exact() {
        let registry = registry(&[(1, "A"), (2, "B"), (3, "A"), (4, "C"), (5, "B")]);
        let plan = GroupPlan::build(&registry);

        // Union of members equals the registered ID set, each exactly once.
        let mut all: Vec<u8> = plan
            .groups()
            .iter()
            .flat_map(|g| g.member_ids.iter().copied())
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_single_default_group() {
        let registry = registry(&[(1, "default"), (2, "default")]);
        let plan = GroupPlan::build(&registry);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.groups()[0].member_ids, vec![1, 2]);
    }
}
