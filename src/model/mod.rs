pub mod api;
pub mod db;
pub mod embedding;
pub mod mongodb;
