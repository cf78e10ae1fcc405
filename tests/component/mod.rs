pub mod docker;
pub mod mongo;
pub mod nats;
pub mod postgres;
