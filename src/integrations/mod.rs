//! External service integrations.

pub mod genai_client {
    pub use crate::genai_client::*;
}

pub mod circuit_breaker {
    pub use crate::circuit_breaker::*;
}
