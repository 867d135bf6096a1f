//! JSON payloads exchanged with the mock backend.

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SithLink {
    pub id: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SithStatus {
    pub id: u32,
    pub name: String,
    pub homeworld: PlanetInfo,
    #[serde(default)]
    pub master: Option<SithLink>,
    #[serde(default)]
    pub apprentice: Option<SithLink>,
}

impl SithStatus {
    pub fn master_id(&self) -> Option<u32> {
        self.master.as_ref().and_then(|m| m.id)
    }

    pub fn apprentice_id(&self) -> Option<u32> {
        self.apprentice.as_ref().and_then(|a| a.id)
    }
}

pub fn parse_sith_status(json: &str) -> anyhow::Result<SithStatus> {
    serde_json::from_str(json).with_context(|| format!("malformed sith status: {json}"))
}

pub fn parse_planet(json: &str) -> anyhow::Result<PlanetInfo> {
    serde_json::from_str(json).with_context(|| format!("malformed obi-wan location: {json}"))
}
