//! Endpoint candidate list

use crate::config::Endpoint;
use crate::utils::{FailoverError, Result};

/// Ordered, non-empty list of candidate endpoints
///
/// The order is randomized once at construction so independently started
/// clients do not all stampede the same first endpoint; it never changes
/// afterwards.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    /// Build the registry, shuffling with the thread-local generator when asked
    pub fn new(endpoints: Vec<Endpoint>, shuffle: bool) -> Result<Self> {
        if shuffle {
            Self::shuffled(endpoints, &mut fastrand::Rng::new())
        } else {
            Self::in_order(endpoints)
        }
    }

    /// Build the registry with a caller-supplied generator
    pub fn shuffled(mut endpoints: Vec<Endpoint>, rng: &mut fastrand::Rng) -> Result<Self> {
        rng.shuffle(&mut endpoints);
        Self::in_order(endpoints)
    }

    /// Build the registry keeping the given order
    pub fn in_order(endpoints: Vec<Endpoint>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(FailoverError::Configuration(
                "At least one endpoint is required".to_string(),
            ));
        }
        Ok(Self { endpoints })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; construction rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoint at `position`, wrapping around the list
    pub fn get(&self, position: usize) -> &Endpoint {
        &self.endpoints[position % self.endpoints.len()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.endpoints.iter()
    }

    pub fn as_slice(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn endpoints(n: u16) -> Vec<Endpoint> {
        (0..n).map(|i| Endpoint::new(format!("node{}", i), 6379 + i)).collect()
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(
            EndpointRegistry::new(Vec::new(), true),
            Err(FailoverError::Configuration(_))
        ));
        assert!(matches!(
            EndpointRegistry::in_order(Vec::new()),
            Err(FailoverError::Configuration(_))
        ));
    }

    #[test]
    fn test_non_empty_lists_accepted() {
        for n in 1..6 {
            let registry = EndpointRegistry::new(endpoints(n), true).unwrap();
            assert_eq!(registry.len(), n as usize);
            assert!(!registry.is_empty());
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let original = endpoints(8);
        let registry = EndpointRegistry::new(original.clone(), true).unwrap();

        let before: HashSet<String> = original.iter().map(|e| e.to_string()).collect();
        let after: HashSet<String> = registry.iter().map(|e| e.to_string()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_shuffle_spreads_first_endpoint() {
        let original = endpoints(4);
        let mut rng = fastrand::Rng::with_seed(7);
        let firsts: HashSet<String> = (0..200)
            .map(|_| {
                EndpointRegistry::shuffled(original.clone(), &mut rng)
                    .unwrap()
                    .get(0)
                    .to_string()
            })
            .collect();
        assert!(firsts.len() > 1, "first endpoint never changed");
    }

    #[test]
    fn test_in_order_keeps_order_and_wraps() {
        let registry = EndpointRegistry::in_order(endpoints(3)).unwrap();
        assert_eq!(registry.get(0).host, "node0");
        assert_eq!(registry.get(2).host, "node2");
        assert_eq!(registry.get(3).host, "node0");
        assert_eq!(registry.get(7).host, "node1");
    }
}
