pub mod clear;
pub mod inspect;
pub mod resolve;
pub mod stage;
pub mod startup;
