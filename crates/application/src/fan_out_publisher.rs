use std::sync::Arc;

use apiconnector_domain::TopicRoutes;
use tracing::{debug, warn};

use crate::connector_ports::MessageBus;

/// Result of one fan-out attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanOutOutcome {
    /// No topic is registered for the workflow.
    NotRouted,
    /// The payload was handed to the message bus.
    Published {
        /// Destination topic.
        topic: String,
    },
    /// The message bus rejected the payload; not retried.
    Failed {
        /// Destination topic.
        topic: String,
    },
}

/// Republishes call results to the topic routed for their workflow.
#[derive(Clone)]
pub struct FanOutPublisher {
    message_bus: Arc<dyn MessageBus>,
    routes: TopicRoutes,
}

impl FanOutPublisher {
    /// Creates a publisher over a message bus and a static routing table.
    #[must_use]
    pub fn new(message_bus: Arc<dyn MessageBus>, routes: TopicRoutes) -> Self {
        Self {
            message_bus,
            routes,
        }
    }

    /// Publishes `payload` at most once if a topic is routed for `workflow_id`.
    pub async fn publish(&self, workflow_id: Option<&str>, payload: &str) -> FanOutOutcome {
        let Some(topic) = workflow_id.and_then(|workflow_id| self.routes.topic_for(workflow_id))
        else {
            return FanOutOutcome::NotRouted;
        };

        debug!(
            workflow_id = workflow_id.unwrap_or_default(),
            topic = %topic,
            "publishing response data"
        );

        match self
            .message_bus
            .publish(topic, payload.as_bytes().to_vec())
            .await
        {
            Ok(()) => FanOutOutcome::Published {
                topic: topic.to_owned(),
            },
            Err(error) => {
                warn!(topic = %topic, error = %error, "failed to publish response data");
                FanOutOutcome::Failed {
                    topic: topic.to_owned(),
                }
            }
        }
    }
}
