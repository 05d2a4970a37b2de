//! Session configuration

/// Session driver configuration options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the inbound unit channel
    pub inbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 256,
        }
    }
}

impl SessionConfig {
    /// Set the inbound channel capacity (at least 1)
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(SessionConfig::default().inbound_capacity, 256);
    }

    #[test]
    fn test_builder_capacity_floor() {
        assert_eq!(SessionConfig::default().inbound_capacity(0).inbound_capacity, 1);
        assert_eq!(SessionConfig::default().inbound_capacity(32).inbound_capacity, 32);
    }
}
