//! User roles on both sides of the API boundary.
//!
//! The web client and the backend name roles differently. Both sets are
//! closed enums and the mapping between them is an exhaustive `match`, so
//! adding a role fails to compile until both directions handle it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Role as the client presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrontendRole {
    Terapeuta,
    Acompanante,
    Coordinador,
    CoordinadorUno,
    Director,
}

/// Role as the backend stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackendRole {
    Terapeuta,
    AcompanianteExterno,
    CoordinadorUno,
    Director,
}

impl FrontendRole {
    pub const ALL: [Self; 5] = [
        Self::Terapeuta,
        Self::Acompanante,
        Self::Coordinador,
        Self::CoordinadorUno,
        Self::Director,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terapeuta => "TERAPEUTA",
            Self::Acompanante => "ACOMPANANTE",
            Self::Coordinador => "COORDINADOR",
            Self::CoordinadorUno => "COORDINADOR_UNO",
            Self::Director => "DIRECTOR",
        }
    }

    pub fn to_backend(self) -> BackendRole {
        match self {
            Self::Terapeuta => BackendRole::Terapeuta,
            Self::Acompanante => BackendRole::AcompanianteExterno,
            // Both coordinator flavours share one backend role.
            Self::Coordinador | Self::CoordinadorUno => BackendRole::CoordinadorUno,
            Self::Director => BackendRole::Director,
        }
    }

    /// Display title shown in dashboards and signatures.
    pub fn title(self) -> &'static str {
        match self {
            Self::Terapeuta => "Terapeuta Ocupacional",
            Self::Acompanante => "Acompañante Externo",
            Self::Coordinador | Self::CoordinadorUno => "Coordinadora General",
            Self::Director => "Director General",
        }
    }
}

impl BackendRole {
    pub const ALL: [Self; 4] = [
        Self::Terapeuta,
        Self::AcompanianteExterno,
        Self::CoordinadorUno,
        Self::Director,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terapeuta => "TERAPEUTA",
            Self::AcompanianteExterno => "ACOMPANIANTE_EXTERNO",
            Self::CoordinadorUno => "COORDINADOR_UNO",
            Self::Director => "DIRECTOR",
        }
    }

    pub fn to_frontend(self) -> FrontendRole {
        match self {
            Self::Terapeuta => FrontendRole::Terapeuta,
            Self::AcompanianteExterno => FrontendRole::Acompanante,
            Self::CoordinadorUno => FrontendRole::Coordinador,
            Self::Director => FrontendRole::Director,
        }
    }
}

impl From<FrontendRole> for BackendRole {
    fn from(role: FrontendRole) -> Self {
        role.to_backend()
    }
}

impl From<BackendRole> for FrontendRole {
    fn from(role: BackendRole) -> Self {
        role.to_frontend()
    }
}

impl fmt::Display for FrontendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BackendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrontendRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}

impl FromStr for BackendRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}
