pub mod archive;
pub mod commands;
pub mod config;
pub mod install;
pub mod launcher;
pub mod locate;
pub mod python;
pub mod relocate;
pub mod runtime;
pub mod stage;
pub mod tree;
