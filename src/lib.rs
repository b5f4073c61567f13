//! Nutrition-plan backend: filters a meal catalog by fitness goal and avoided
//! ingredients, then writes a week of scheduled meals to a document store.

pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod nutrition;
pub mod state;
pub mod store;
