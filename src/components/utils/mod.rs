//! Module commmun aux composants.

pub mod message;
