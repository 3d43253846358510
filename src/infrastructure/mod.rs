pub mod blockchain;
pub mod persistence;
pub mod web;
