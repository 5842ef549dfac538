use thiserror::Error;

pub mod descriptor;
pub mod graph;
pub mod module;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading graph toml: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing coordinate component `{0}` in string `{1}`")]
    MissingCoordinateComponent(String, String),
    #[error("Edge references unknown node `{0}`")]
    UnknownNode(String),
    #[error("Root node `{0}` is not declared")]
    UnknownRoot(String),
    #[error("Edge from `{0}` must declare exactly one of `to` or `failure`")]
    InvalidEdge(String),
    #[error("Invalid graph: {0}")]
    Graph(#[from] graph::GraphError),
}
