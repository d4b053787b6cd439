#![doc = "The `task_manager` library crate."]
#![doc = ""]
#![doc = "Task CRUD over HTTP, gated by signed bearer tokens. The interesting parts live in"]
#![doc = "[`auth`]: the token codec, the password hasher and the gate that turns credentials"]
#![doc = "or bearer tokens into an authenticated user. [`db`] holds the storage seams,"]
#![doc = "[`routes`] the actix-web handlers. The binary (`main.rs`) wires them together."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::error::AppError;
