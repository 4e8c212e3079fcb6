#![allow(clippy::cast_precision_loss)]

mod cancellation;
mod local_search;
mod multi_objective;
mod scenarios;
mod search;
