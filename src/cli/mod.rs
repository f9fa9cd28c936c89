pub mod build;
pub mod config_check;
pub mod vet;
