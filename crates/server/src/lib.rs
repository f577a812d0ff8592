#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! grove-server: the HTTP/2-over-Unix-socket front door onto a [`grove_store::Store`].

mod pid;
mod router;
mod server;

pub use pid::{PidError, PidGuard};
pub use router::{build_router, AppState};
pub use server::{listen_and_serve, ServerError};
