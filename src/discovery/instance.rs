//! Discovery data model.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Logical backend name; the discovery key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(Arc<str>);

impl ServiceName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One running copy of a service. Never mutated; a change replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Registry-assigned instance id.
    pub id: String,
    /// `host:port` the instance answers on. Also the stable ordering key.
    pub address: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ServiceInstance {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Sort by address, then id, so selection over a fixed set is reproducible.
pub fn sort_instances(instances: &mut [ServiceInstance]) {
    instances.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.id.cmp(&b.id)));
}

/// Result of one discovery query.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub instances: Vec<ServiceInstance>,
    /// Change index for blocking follow-up queries, when the backend has one.
    pub index: Option<u64>,
}

/// Membership difference published by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub service: ServiceName,
    pub added: Vec<ServiceInstance>,
    pub removed: Vec<ServiceInstance>,
    /// Instance count after the change.
    pub total: usize,
}

impl MembershipChange {
    /// Diff two sorted instance lists; `None` when nothing changed.
    pub fn between(
        service: &ServiceName,
        before: &[ServiceInstance],
        after: &[ServiceInstance],
    ) -> Option<Self> {
        if before == after {
            return None;
        }
        let added = after.iter().filter(|i| !before.contains(i)).cloned().collect();
        let removed = before.iter().filter(|i| !after.contains(i)).cloned().collect();
        Some(Self {
            service: service.clone(),
            added,
            removed,
            total: after.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_by_address_then_id() {
        let mut list = vec![
            ServiceInstance::new("c", "10.0.0.3:80"),
            ServiceInstance::new("b2", "10.0.0.1:80"),
            ServiceInstance::new("a", "10.0.0.1:80"),
        ];
        sort_instances(&mut list);
        let ids: Vec<_> = list.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b2", "c"]);
    }

    #[test]
    fn test_membership_diff() {
        let name = ServiceName::from("club");
        let a = ServiceInstance::new("a", "10.0.0.1:80");
        let b = ServiceInstance::new("b", "10.0.0.2:80");
        let c = ServiceInstance::new("c", "10.0.0.3:80");

        assert!(MembershipChange::between(&name, &[a.clone()], &[a.clone()]).is_none());

        let change = MembershipChange::between(&name, &[a.clone(), b.clone()], &[b, c.clone()]).unwrap();
        assert_eq!(change.added, vec![c]);
        assert_eq!(change.removed, vec![a]);
        assert_eq!(change.total, 2);
    }
}
