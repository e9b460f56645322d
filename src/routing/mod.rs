//! Shortest-path search over the street network

pub mod dijkstra;
pub mod yen;

pub use yen::{PathCandidate, k_shortest_paths};
