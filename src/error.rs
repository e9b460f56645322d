use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No route exists between the requested endpoints")]
    NoRoute,
    #[error("Route computation succeeded with zero paths")]
    EmptyResult,
}
