//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::discovery::{ServiceInstance, ServiceName};
use crate::load_balancer::SelectionStrategy;

/// Round-robin selector.
/// Keeps one monotonic counter per service so services rotate independently.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counters: DashMap<ServiceName, AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(&self, service: &ServiceName) -> usize {
        if let Some(counter) = self.counters.get(service) {
            return counter.fetch_add(1, Ordering::Relaxed);
        }
        self.counters
            .entry(service.clone())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl SelectionStrategy for RoundRobin {
    fn select<'a>(&self, service: &ServiceName, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        let sequence = self.next_sequence(service);
        instances.get(sequence % instances.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn abc() -> Vec<ServiceInstance> {
        vec![
            ServiceInstance::new("a", "10.0.0.1:80"),
            ServiceInstance::new("b", "10.0.0.2:80"),
            ServiceInstance::new("c", "10.0.0.3:80"),
        ]
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let service = ServiceName::from("club");
        let instances = abc();

        let picked: Vec<_> = (0..7)
            .map(|_| lb.select(&service, &instances).unwrap().id.as_str())
            .collect();
        assert_eq!(picked, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_counters_are_per_service() {
        let lb = RoundRobin::new();
        let instances = abc();
        let club = ServiceName::from("club");
        let auth = ServiceName::from("auth");

        assert_eq!(lb.select(&club, &instances).unwrap().id, "a");
        assert_eq!(lb.select(&club, &instances).unwrap().id, "b");
        assert_eq!(lb.select(&auth, &instances).unwrap().id, "a");
    }

    #[test]
    fn test_empty_set_selects_nothing() {
        let lb = RoundRobin::new();
        assert!(lb.select(&"club".into(), &[]).is_none());
    }

    #[test]
    fn test_concurrent_selection_is_balanced() {
        let lb = Arc::new(RoundRobin::new());
        let instances = Arc::new(abc());
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let lb = lb.clone();
                let instances = instances.clone();
                std::thread::spawn(move || {
                    (0..300)
                        .map(|_| lb.select(&"club".into(), &instances).unwrap().id.clone())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = std::collections::HashMap::new();
        for h in handles {
            for id in h.join().unwrap() {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        assert_eq!(counts.values().copied().collect::<Vec<_>>(), vec![600, 600, 600]);
    }
}
