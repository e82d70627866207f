//! Octagon trust circle, from `otctl status -j`.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::{field, lookup};
use crate::{ArtifactRecord, ArtifactTable, ArtifactType, ExtractionError};

pub const SELF_HEADERS: &[&str] = &["ID", "SN", "Model", "OS Version"];
pub const PEER_HEADERS: &[&str] = &["Peer ID", "SN", "Model", "OS Version"];

pub const SELF_CAPTION: &str = "Device Self Information";
pub const TRUSTED_CAPTION: &str = "Trusted peers";
pub const EXCLUDED_CAPTION: &str = "Excluded peers";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustPeer {
    pub peer_id: String,
    pub serial_number: String,
    pub model_id: String,
    pub os_version: String,
}

impl TrustPeer {
    fn from_value(peer: &Value) -> Self {
        Self {
            peer_id: field(peer, &["peerID"]),
            serial_number: field(peer, &["stableInfo", "serial_number"]),
            model_id: field(peer, &["permanentInfo", "model_id"]),
            os_version: field(peer, &["stableInfo", "os_version"]),
        }
    }
}

impl From<TrustPeer> for ArtifactRecord {
    fn from(peer: TrustPeer) -> Self {
        ArtifactRecord::new([
            peer.peer_id,
            peer.serial_number,
            peer.model_id,
            peer.os_version,
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustGraph {
    pub local: TrustPeer,
    pub trusted: Vec<TrustPeer>,
    pub excluded: Vec<TrustPeer>,
}

impl TrustGraph {
    pub fn tables(self) -> Vec<ArtifactTable> {
        vec![
            ArtifactTable::new(SELF_CAPTION, SELF_HEADERS, vec![self.local.into()]),
            ArtifactTable::new(
                TRUSTED_CAPTION,
                PEER_HEADERS,
                self.trusted.into_iter().map(Into::into).collect(),
            ),
            ArtifactTable::new(
                EXCLUDED_CAPTION,
                PEER_HEADERS,
                self.excluded.into_iter().map(Into::into).collect(),
            ),
        ]
    }
}

fn id_set(value: Option<&Value>) -> HashSet<&str> {
    value
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn mismatch(expected: &'static str) -> ExtractionError {
    ExtractionError::StructuralMismatch {
        artifact: ArtifactType::TrustPeers,
        expected,
    }
}

/// Splits `contextDump.peers` by membership in the local device's `dynamicInfo` sets.
///
/// Inclusion takes precedence over exclusion; a peer in neither set is dropped.
pub fn extract(doc: &Value) -> Result<TrustGraph, ExtractionError> {
    let dump = doc
        .get("contextDump")
        .filter(|v| v.is_object())
        .ok_or_else(|| mismatch("contextDump"))?;
    let local = dump
        .get("self")
        .filter(|v| v.is_object())
        .ok_or_else(|| mismatch("contextDump.self"))?;

    let included = id_set(lookup(local, &["dynamicInfo", "included"]));
    let excluded = id_set(lookup(local, &["dynamicInfo", "excluded"]));

    let mut graph = TrustGraph {
        local: TrustPeer::from_value(local),
        trusted: Vec::new(),
        excluded: Vec::new(),
    };
    let peers = dump.get("peers").and_then(Value::as_array);
    for peer in peers.into_iter().flatten() {
        let Some(peer_id) = peer.get("peerID").and_then(Value::as_str) else {
            continue;
        };
        if included.contains(peer_id) {
            graph.trusted.push(TrustPeer::from_value(peer));
        } else if excluded.contains(peer_id) {
            graph.excluded.push(TrustPeer::from_value(peer));
        }
    }
    Ok(graph)
}

/// `contextDump.self.stableInfo.serial_number`, if reported.
pub fn serial_number(doc: &Value) -> Option<String> {
    lookup(doc, &["contextDump", "self", "stableInfo", "serial_number"])
        .and_then(Value::as_str)
        .map(str::to_string)
}
