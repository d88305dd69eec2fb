pub mod backend;
pub mod config;
pub mod error;
pub mod form;
pub mod http_client;
pub mod model;
pub mod persist;
pub mod player_form;
pub mod players_view;
pub mod provider;
pub mod reports;
pub mod router;
pub mod session;
pub mod state;
pub mod statistics_view;
pub mod ui;
