#![allow(clippy::cast_precision_loss)]

mod adaptive;
mod rejection;
mod uniform;
