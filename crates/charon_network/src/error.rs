use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("no path from node {from} to node {to}")]
    NoPath { from: String, to: String },
    #[error("unknown node {id}")]
    UnknownNode { id: String },
    #[error("duplicate node {id}")]
    DuplicateNode { id: String },
    #[error("edge {from} -> {to} must have a positive travel time")]
    NonPositiveTravelTime { from: String, to: String },
    #[error("node {id} is not a travel plan terminal")]
    NotATerminal { id: String },
}
