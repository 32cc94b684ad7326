//! Validated, immutable room catalog.
//!
//! Raw records come from whatever storage the caller uses (JSON on disk in
//! the harness). [`RoomCatalog::load`] keeps the good ones in input order
//! and reports every record it had to drop. A catalog never changes after
//! construction; a refresh builds a new one.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::geometry::{bounds_of, Bounds, LatLon};

pub type RoomId = u32;

/// A room that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub building: String,
    pub floor: String,
    pub position: LatLon,
    pub category: Option<String>,
    pub images: Vec<String>,
}

/// A room record as it arrives from storage. Every field is optional; a
/// missing `id` is filled in at load time.
///
/// [`RoomCatalog::from_json_str`] converts each array element on its own, so
/// a wrong-typed field drops that record only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRoom {
    pub id: Option<RoomId>,
    #[serde(alias = "room_name")]
    pub name: Option<String>,
    pub building: Option<String>,
    #[serde(default, deserialize_with = "floor_label")]
    pub floor: Option<String>,
    #[serde(alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(alias = "longitude")]
    pub lon: Option<f64>,
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Floors show up as `"2"`, `2` or `"Ground"` depending on who typed the data.
fn floor_label<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Floor {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Floor>::deserialize(deserializer)?.map(|f| match f {
        Floor::Text(s) => s,
        Floor::Int(n) => n.to_string(),
        Floor::Float(x) => x.to_string(),
    }))
}

/// Why a raw record was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("room {0} has no name")]
    MissingName(RoomId),
    #[error("room {0} has no coordinates")]
    MissingCoordinate(RoomId),
    #[error("room {id} has non-finite coordinates ({lat}, {lon})")]
    NonFiniteCoordinate { id: RoomId, lat: f64, lon: f64 },
    #[error("room {id} at ({lat}, {lon}) is outside the campus envelope")]
    OutsideEnvelope { id: RoomId, lat: f64, lon: f64 },
    #[error("duplicate room id {0}")]
    DuplicateId(RoomId),
}

/// A rejected record and its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRecord {
    pub index: usize,
    pub error: RecordError,
}

/// Outcome of a catalog load besides the catalog itself.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: Vec<DroppedRecord>,
}

impl LoadReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rooms loaded, {} dropped", self.loaded, self.dropped.len())
    }
}

/// Read-only collection of validated rooms in load order.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    rooms: Vec<Room>,
    index: HashMap<RoomId, usize>,
}

impl RoomCatalog {
    /// Validate `records` against `envelope` and build a catalog.
    ///
    /// Bad records are skipped, never fatal. The first record with a given
    /// id wins; later duplicates are dropped. Records without an id get the
    /// lowest id not used explicitly anywhere in the input, in input order.
    pub fn load(records: &[RawRoom], envelope: &Bounds) -> (Self, LoadReport) {
        Self::assemble(records.iter().map(Ok).collect(), envelope)
    }

    /// Parse a JSON array of room records and load it.
    ///
    /// Only a document that is not a JSON array is an error. Elements that do
    /// not fit [`RawRoom`] are dropped as [`RecordError::Malformed`].
    pub fn from_json_str(json: &str, envelope: &Bounds) -> Result<(Self, LoadReport)> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let parsed: Vec<std::result::Result<RawRoom, RecordError>> = values
            .into_iter()
            .map(|v| RawRoom::deserialize(v).map_err(|e| RecordError::Malformed(e.to_string())))
            .collect();
        let entries = parsed.iter().map(|r| r.as_ref().map_err(Clone::clone)).collect();
        Ok(Self::assemble(entries, envelope))
    }

    fn assemble(
        entries: Vec<std::result::Result<&RawRoom, RecordError>>,
        envelope: &Bounds,
    ) -> (Self, LoadReport) {
        let mut rooms = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        let mut report = LoadReport::default();

        let explicit: HashSet<RoomId> = entries
            .iter()
            .filter_map(|e| e.as_ref().ok().and_then(|raw| raw.id))
            .collect();
        let mut next_auto: RoomId = 1;

        for (i, entry) in entries.into_iter().enumerate() {
            let validated = entry.and_then(|raw| {
                let id = match raw.id {
                    Some(id) => id,
                    None => {
                        while explicit.contains(&next_auto) || index.contains_key(&next_auto) {
                            next_auto += 1;
                        }
                        next_auto
                    }
                };
                validate_record(raw, id, envelope)
            });
            match validated {
                Ok(room) if index.contains_key(&room.id) => {
                    report.dropped.push(DroppedRecord {
                        index: i,
                        error: RecordError::DuplicateId(room.id),
                    });
                }
                Ok(room) => {
                    index.insert(room.id, rooms.len());
                    rooms.push(room);
                }
                Err(error) => report.dropped.push(DroppedRecord { index: i, error }),
            }
        }

        for d in &report.dropped {
            log::debug!("Dropped room record #{}: {}", d.index, d.error);
        }
        report.loaded = rooms.len();
        if report.dropped.is_empty() {
            log::info!("Room catalog: {}", report);
        } else {
            log::warn!("Room catalog: {}", report);
        }

        (Self { rooms, index }, report)
    }

    /// All rooms, in load order.
    pub fn all(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up a room. A miss is an ordinary outcome, not an error.
    pub fn by_id(&self, id: RoomId) -> Option<&Room> {
        self.index.get(&id).map(|&i| &self.rooms[i])
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Bounding box of every room, `None` for an empty catalog.
    pub fn bounds(&self) -> Option<Bounds> {
        let points: Vec<LatLon> = self.rooms.iter().map(|r| r.position).collect();
        bounds_of(&points).ok()
    }
}

fn validate_record(raw: &RawRoom, id: RoomId, envelope: &Bounds) -> std::result::Result<Room, RecordError> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(RecordError::MissingName(id))?;

    let (lat, lon) = match (raw.lat, raw.lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(RecordError::MissingCoordinate(id)),
    };
    let position = LatLon::new(lat, lon);
    if !position.is_finite() {
        return Err(RecordError::NonFiniteCoordinate { id, lat, lon });
    }
    if !envelope.contains(position) {
        return Err(RecordError::OutsideEnvelope { id, lat, lon });
    }

    Ok(Room {
        id,
        name: name.to_string(),
        building: raw.building.clone().unwrap_or_default(),
        floor: raw.floor.clone().unwrap_or_default(),
        position,
        category: raw.category.clone(),
        images: raw.images.clone(),
    })
}
