use std::collections::BTreeMap;

use apiconnector_core::{AppError, AppResult};

/// Static workflow-to-topic routing table for response fan-out.
///
/// Built from a list of single-entry maps; the first entry naming a workflow wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicRoutes {
    routes: Vec<(String, String)>,
}

impl TopicRoutes {
    /// Creates routes from `(workflow_id, topic)` pairs in priority order.
    #[must_use]
    pub fn new(routes: Vec<(String, String)>) -> Self {
        Self { routes }
    }

    /// Parses the `[{"workflow_id": "topic"}, ...]` configuration format.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let entries: Vec<BTreeMap<String, String>> =
            serde_json::from_str(raw).map_err(|error| {
                AppError::Validation(format!("invalid topic routes configuration: {error}"))
            })?;

        Ok(Self::new(entries.into_iter().flatten().collect()))
    }

    /// Returns the topic registered for a workflow.
    #[must_use]
    pub fn topic_for(&self, workflow_id: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(candidate, _)| candidate == workflow_id)
            .map(|(_, topic)| topic.as_str())
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::TopicRoutes;

    #[test]
    fn first_route_for_a_workflow_wins() {
        let routes = TopicRoutes::from_json(
            r#"[{"orders_sync": "orders-topic"}, {"users_sync": "users-topic"}, {"orders_sync": "shadow"}]"#,
        );
        let Ok(routes) = routes else {
            panic!("routes should parse");
        };

        assert_eq!(routes.topic_for("orders_sync"), Some("orders-topic"));
        assert_eq!(routes.topic_for("users_sync"), Some("users-topic"));
        assert_eq!(routes.topic_for("billing"), None);
    }

    #[test]
    fn empty_configuration_has_no_routes() {
        assert!(TopicRoutes::from_json("").is_ok_and(|routes| routes.is_empty()));
    }

    #[test]
    fn malformed_configuration_is_rejected() {
        assert!(TopicRoutes::from_json(r#"{"orders_sync": "orders-topic"}"#).is_err());
    }
}
