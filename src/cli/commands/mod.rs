pub mod db;
pub mod ping;
pub mod serve;
pub mod token;
