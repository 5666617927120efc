//! Uniform random selection strategy.

use rand::Rng;

use crate::discovery::{ServiceInstance, ServiceName};
use crate::load_balancer::SelectionStrategy;

/// Random selector. Stateless.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionStrategy for Random {
    fn select<'a>(&self, _service: &ServiceName, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..instances.len());
        instances.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_stays_in_bounds() {
        let lb = Random::new();
        let instances = vec![
            ServiceInstance::new("a", "10.0.0.1:80"),
            ServiceInstance::new("b", "10.0.0.2:80"),
        ];
        for _ in 0..100 {
            let picked = lb.select(&"club".into(), &instances).unwrap();
            assert!(picked.id == "a" || picked.id == "b");
        }
        assert!(lb.select(&"club".into(), &[]).is_none());
    }
}
