use regex_lite::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::Display,
    str::FromStr,
    sync::OnceLock,
};

use crate::model::ParseError;

fn coordinate_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(?P<group>[^:\s]+):(?P<name>[^:\s]+)(?::(?P<version>[^:\s]*))?$")
            .expect("coordinate regex is valid")
    })
}

struct Coordinate {
    group: String,
    name: String,
    version: Option<String>,
}

impl Coordinate {
    fn parse(value: &str) -> Result<Coordinate, ParseError> {
        let captures = coordinate_regex().captures(value.trim());
        let captures = captures.as_ref();
        let component = |component: &str| {
            captures
                .and_then(|c| c.name(component))
                .map(|s| s.as_str().to_string())
        };

        Ok(Coordinate {
            group: component("group").ok_or_else(|| {
                ParseError::MissingCoordinateComponent("group".to_string(), value.to_string())
            })?,
            name: component("name").ok_or_else(|| {
                ParseError::MissingCoordinateComponent("name".to_string(), value.to_string())
            })?,
            version: component("version"),
        })
    }
}

/// The `group:name:version` of a module version selected by the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleIdentifier {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ModuleIdentifier {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl FromStr for ModuleIdentifier {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Coordinate {
            group,
            name,
            version,
        } = Coordinate::parse(value)?;
        match version {
            Some(version) if !version.is_empty() => Ok(ModuleIdentifier {
                group,
                name,
                version,
            }),
            _ => Err(ParseError::MissingCoordinateComponent(
                "version".to_string(),
                value.to_string(),
            )),
        }
    }
}

impl Display for ModuleIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// The module a dependency edge asked for. The version is a constraint and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ModuleSelector {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleSelector {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ModuleSelector {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl FromStr for ModuleSelector {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Coordinate {
            group,
            name,
            version,
        } = Coordinate::parse(value)?;
        Ok(ModuleSelector {
            group,
            name,
            version: version.unwrap_or_default(),
        })
    }
}

impl Display for ModuleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}:{}", self.group, self.name)
        } else {
            write!(f, "{}:{}:{}", self.group, self.name, self.version)
        }
    }
}

macro_rules! string_serde {
    ($type:ty) => {
        impl Serialize for $type {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(de::Error::custom)
            }
        }
    };
}

string_serde!(ModuleIdentifier);
string_serde!(ModuleSelector);

/// Identity of a resolved module configuration, unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct NodeId {
    pub module: ModuleIdentifier,
    pub configuration: String,
}

impl NodeId {
    pub fn new(module: ModuleIdentifier, configuration: impl Into<String>) -> Self {
        NodeId {
            module,
            configuration: configuration.into(),
        }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}({})", self.module, self.configuration)
    }
}

impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The dependency as the user declared it on the root configuration.
#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct DependencyDeclaration(String);

impl DependencyDeclaration {
    pub fn new(s: impl Into<String>) -> Self {
        DependencyDeclaration(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DependencyDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DependencyDeclaration {
    fn from(s: &str) -> Self {
        DependencyDeclaration(s.to_string())
    }
}

/// Why an edge could not be resolved to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveFailure {
    pub message: String,
}

impl ResolveFailure {
    pub fn new(message: impl Into<String>) -> Self {
        ResolveFailure {
            message: message.into(),
        }
    }
}

impl Display for ResolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ResolveFailure {}
