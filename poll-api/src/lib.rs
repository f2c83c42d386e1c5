//! Wire types shared by the arbiter service and its clients.

pub mod evaluation;
pub mod rest;
pub mod verdict;
