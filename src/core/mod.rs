// Domain-layer modules and shared errors/models
pub mod catalog {
    pub use crate::catalog::*;
}

pub mod generation {
    pub use crate::generation::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod profile {
    pub use crate::profile::*;
}

pub mod errors {
    pub use crate::errors::*;
}
