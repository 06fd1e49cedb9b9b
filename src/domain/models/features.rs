use serde::Serialize;
use utoipa::ToSchema;

/// Framework-level feature switches, fixed once the router is built.
///
/// These are independent of the header policies: disabling
/// `strict_transport_security` here does not stop a registered `hsts` policy
/// from writing its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AppFeatures {
    pub strict_transport_security: bool,
}

impl Default for AppFeatures {
    fn default() -> Self {
        Self {
            strict_transport_security: true,
        }
    }
}

impl AppFeatures {
    pub fn disable_strict_transport_security(mut self) -> Self {
        self.strict_transport_security = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_strict_transport_security() {
        let features = AppFeatures::default();
        assert!(features.strict_transport_security);

        let features = features.disable_strict_transport_security();
        assert!(!features.strict_transport_security);
    }
}
