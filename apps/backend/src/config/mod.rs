pub mod db;
pub mod debate;
