//! Persisted workspace artifact (§6 SUPPLEMENT).
//!
//! `spec.md` describes this document's shape but not its wire encoding;
//! `original_source/` kept no files for this crate (filtered out by the
//! retrieval cap), so the encoding is resolved from the pack's dominant
//! convention for save/config structures: `serde` + `serde_json`. This
//! crate only defines and (de)serializes the type — writing it to disk is
//! an embedding UI's job, not this library's.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableNote {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionNote {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<String>,
    pub description: String,
}

/// The shape an embedding UI persists between sessions: which file is
/// open, what has been run on it, and any annotations a user has added to
/// variables or functions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    pub current_file: Option<String>,
    pub recent_files: Vec<String>,
    pub is_disassembled: bool,
    pub is_decompiled: bool,
    pub variables: HashMap<String, VariableNote>,
    pub functions: HashMap<String, FunctionNote>,
}

impl Workspace {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let mut workspace = Workspace {
            current_file: Some("smb.nes".to_string()),
            is_disassembled: true,
            ..Default::default()
        };
        workspace.variables.insert(
            "PPUCTRL".to_string(),
            VariableNote {
                name: "PPUCTRL".to_string(),
                var_type: "Byte".to_string(),
                description: "PPU control register".to_string(),
            },
        );

        let json = workspace.to_json().unwrap();
        let restored = Workspace::from_json(&json).unwrap();
        assert_eq!(restored.current_file, workspace.current_file);
        assert!(restored.is_disassembled);
        assert_eq!(restored.variables["PPUCTRL"].name, "PPUCTRL");
    }
}
