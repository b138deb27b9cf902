pub mod cli;
pub mod config;
pub mod persistence;
pub mod registry;
pub mod simulation;
pub mod world;
