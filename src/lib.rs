pub mod config;
pub mod dispatch;
pub mod error;
pub mod observer;
pub mod parsers;
pub mod request;
pub mod requester;
pub mod response;
