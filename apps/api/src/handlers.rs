pub mod connector;
pub mod health;
pub mod queues;
