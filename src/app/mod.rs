pub mod bootstrap;
pub mod menu;
pub mod services;
