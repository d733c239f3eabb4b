//! The two loops of a running session.

pub(crate) mod inbound;
pub(crate) mod outbound;
