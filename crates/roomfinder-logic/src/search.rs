//! Free-text room search: substring hits first, fuzzy matches after.
//!
//! Each room is scored on its name, building and floor label. A substring
//! hit on any field scores 100; otherwise the best per-field fuzzy
//! similarity (0–100, see [`fuzzy_score`]) is used. Results are sorted
//! by score with catalog order breaking ties, so the same query over the
//! same catalog always produces the same list.
//!
//! An empty query returns nothing. The default view is curated through
//! [`SearchIndex::featured`] instead of dumping the whole catalog.
//!
//! ```
//! use roomfinder_logic::catalog::{RawRoom, RoomCatalog};
//! use roomfinder_logic::geometry::Bounds;
//! use roomfinder_logic::search::search;
//!
//! let raw = RawRoom {
//!     id: Some(1),
//!     name: Some("Room 101A".into()),
//!     building: Some("Main".into()),
//!     lat: Some(-0.1234567),
//!     lon: Some(36.1234567),
//!     ..RawRoom::default()
//! };
//! let (catalog, _) = RoomCatalog::load(&[raw], &Bounds::WORLD);
//! let hits = search("101a", &catalog, 5, 60.0);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].score, 100.0);
//! ```

use crate::catalog::{Room, RoomCatalog};

/// Score for a case-insensitive substring hit.
pub const SUBSTRING_SCORE: f64 = 100.0;

/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub room: &'a Room,
    /// 0–100.
    pub score: f64,
}

/// Lowercase, trim, and collapse runs of whitespace to one space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Weight of a match against one word of a multi-word field.
const TOKEN_SCALE: f64 = 0.95;
/// Weight of a match against a query-sized slice of a longer field.
const PARTIAL_SCALE: f64 = 0.9;
/// Partial weight once the field is much longer than the query.
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Fuzzy similarity of two already-normalized strings, 0–100.
///
/// Best of three views, each normalized Levenshtein similarity:
/// the whole field; each word of the field (so a typo in one word of
/// "Registrar Office" still scores high); and, when the field is at least
/// 1.5× longer than the query, every query-length window of the field.
pub fn fuzzy_score(query: &str, target: &str) -> f64 {
    if query.is_empty() || target.is_empty() {
        return 0.0;
    }
    let whole = strsim::normalized_levenshtein(query, target);

    let token = if target.contains(' ') {
        target
            .split(' ')
            .map(|word| strsim::normalized_levenshtein(query, word))
            .fold(0.0, f64::max)
            * TOKEN_SCALE
    } else {
        0.0
    };

    let q_len = query.chars().count();
    let chars: Vec<char> = target.chars().collect();
    let ratio = chars.len() as f64 / q_len as f64;
    let partial = if ratio >= 1.5 {
        let scale = if ratio > 8.0 { LONG_PARTIAL_SCALE } else { PARTIAL_SCALE };
        chars
            .windows(q_len)
            .map(|w| strsim::normalized_levenshtein(query, &w.iter().collect::<String>()))
            .fold(0.0, f64::max)
            * scale
    } else {
        0.0
    };

    whole.max(token).max(partial) * 100.0
}

/// Normalized search fields of one room.
#[derive(Debug, Clone)]
struct IndexedRoom {
    name: String,
    building: String,
    floor: String,
}

impl IndexedRoom {
    fn fields(&self) -> [&str; 3] {
        [&self.name, &self.building, &self.floor]
    }

    fn score(&self, query: &str) -> f64 {
        let fields = self.fields();
        if fields.iter().any(|f| !f.is_empty() && f.contains(query)) {
            return SUBSTRING_SCORE;
        }
        fields
            .iter()
            .map(|f| fuzzy_score(query, f))
            .fold(0.0, f64::max)
    }
}

/// Catalog plus pre-normalized fields, built once per catalog.
#[derive(Debug, Clone)]
pub struct SearchIndex<'a> {
    catalog: &'a RoomCatalog,
    entries: Vec<IndexedRoom>,
}

impl<'a> SearchIndex<'a> {
    pub fn new(catalog: &'a RoomCatalog) -> Self {
        let entries = catalog
            .all()
            .iter()
            .map(|r| IndexedRoom {
                name: normalize(&r.name),
                building: normalize(&r.building),
                floor: normalize(&r.floor),
            })
            .collect();
        Self { catalog, entries }
    }

    /// Rank rooms against `query`, keeping at most `limit` hits scoring at
    /// least `fuzzy_threshold`.
    pub fn search(&self, query: &str, limit: usize, fuzzy_threshold: f64) -> Vec<SearchHit<'a>> {
        let q = normalize(query);
        if q.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'a>> = self
            .catalog
            .all()
            .iter()
            .zip(&self.entries)
            .filter_map(|(room, entry)| {
                let score = entry.score(&q);
                (score >= fuzzy_threshold).then_some(SearchHit { room, score })
            })
            .collect();

        // Stable: equal scores keep catalog order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    /// "Did you mean" names, ranked by fuzzy similarity of the name alone.
    pub fn suggest(&self, query: &str, limit: usize, threshold: f64) -> Vec<&'a str> {
        let q = normalize(query);
        if q.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(&'a str, f64)> = self
            .catalog
            .all()
            .iter()
            .zip(&self.entries)
            .map(|(room, entry)| (room.name.as_str(), fuzzy_score(&q, &entry.name)))
            .filter(|(_, s)| *s >= threshold)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut names: Vec<&'a str> = Vec::new();
        for (name, _) in scored {
            if names.len() == limit {
                break;
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Resolve a curated list of room names (case-insensitive) for the
    /// empty-query view. Unknown names are skipped; order follows `names`.
    pub fn featured(&self, names: &[String]) -> Vec<&'a Room> {
        let mut rooms: Vec<&'a Room> = Vec::new();
        for wanted in names.iter().map(|n| normalize(n)) {
            let found = self
                .catalog
                .all()
                .iter()
                .zip(&self.entries)
                .find(|(_, e)| e.name == wanted)
                .map(|(r, _)| r);
            match found {
                Some(room) if !rooms.iter().any(|r| r.id == room.id) => rooms.push(room),
                Some(_) => {}
                None => log::debug!("Featured room {:?} not in catalog", wanted),
            }
        }
        rooms
    }
}

/// One-shot search without keeping an index around.
pub fn search<'a>(
    query: &str,
    catalog: &'a RoomCatalog,
    limit: usize,
    fuzzy_threshold: f64,
) -> Vec<SearchHit<'a>> {
    SearchIndex::new(catalog).search(query, limit, fuzzy_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawRoom;
    use crate::geometry::Bounds;

    fn raw(id: u32, name: &str, building: &str, floor: &str) -> RawRoom {
        RawRoom {
            id: Some(id),
            name: Some(name.into()),
            building: Some(building.into()),
            floor: Some(floor.into()),
            lat: Some(-0.748),
            lon: Some(37.15),
            ..RawRoom::default()
        }
    }

    fn single() -> RoomCatalog {
        let r = RawRoom {
            id: Some(1),
            name: Some("Room 101A".into()),
            building: Some("Main".into()),
            lat: Some(-0.1234567),
            lon: Some(36.1234567),
            ..RawRoom::default()
        };
        RoomCatalog::load(&[r], &Bounds::WORLD).0
    }

    fn campus() -> RoomCatalog {
        RoomCatalog::load(
            &[
                raw(1, "Library", "Central Block", "Ground"),
                raw(2, "Computer Lab 1", "ICT Block", "1"),
                raw(3, "Computer Lab 2", "ICT Block", "2"),
                raw(4, "Cafeteria", "Student Centre", "Ground"),
                raw(5, "A101", "Block A", "1"),
                raw(6, "B205", "Block B", "2"),
                raw(7, "Auditorium", "Central Block", "Ground"),
            ],
            &Bounds::WORLD,
        )
        .0
    }

    #[test]
    fn test_case_insensitive_substring() {
        let catalog = single();
        let hits = search("101a", &catalog, 5, 60.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].room.id, 1);
        assert_eq!(hits[0].score, 100.0);
    }

    #[test]
    fn test_fuzzy_typo_still_matches() {
        let catalog = single();
        let hits = search("rom 101", &catalog, 5, 60.0);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score >= 60.0 && hits[0].score < 100.0);
    }

    #[test]
    fn test_no_match() {
        assert!(search("zzz", &single(), 5, 60.0).is_empty());
    }

    #[test]
    fn test_empty_and_whitespace_query() {
        let catalog = campus();
        assert!(search("", &catalog, 5, 0.0).is_empty());
        assert!(search("   \t", &catalog, 5, 0.0).is_empty());
    }

    #[test]
    fn test_building_and_floor_fields_match() {
        let catalog = campus();
        let hits = search("ict block", &catalog, 10, 60.0);
        let ids: Vec<u32> = hits.iter().filter(|h| h.score == 100.0).map(|h| h.room.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let ground = search("ground", &catalog, 10, 100.0);
        let ids: Vec<u32> = ground.iter().map(|h| h.room.id).collect();
        assert_eq!(ids, vec![1, 4, 7]);
    }

    #[test]
    fn test_ties_keep_catalog_order_and_limit() {
        let catalog = campus();
        let hits = search("lab", &catalog, 1, 60.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].room.id, 2);

        let hits = search("computer lab", &catalog, 10, 60.0);
        assert_eq!(hits[0].room.id, 2);
        assert_eq!(hits[1].room.id, 3);
    }

    #[test]
    fn test_sorted_non_increasing_and_bounded() {
        let catalog = campus();
        for q in ["lab", "libary", "a1", "cafe", "block", "audit", "b2"] {
            for k in 0..5 {
                let hits = search(q, &catalog, k, 30.0);
                assert!(hits.len() <= k);
                for w in hits.windows(2) {
                    assert!(w[0].score >= w[1].score, "query {:?}", q);
                }
            }
        }
    }

    #[test]
    fn test_whitespace_in_query_normalized() {
        let catalog = campus();
        let hits = search("  COMPUTER    lab 2 ", &catalog, 5, 100.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].room.id, 3);
    }

    #[test]
    fn test_threshold_filters() {
        let catalog = campus();
        let loose = search("libary", &catalog, 10, 50.0);
        assert_eq!(loose[0].room.id, 1);
        let strict = search("libary", &catalog, 10, 95.0);
        assert!(strict.is_empty());
    }

    #[test]
    fn test_suggest() {
        let catalog = campus();
        let index = SearchIndex::new(&catalog);
        assert_eq!(index.suggest("libary", 3, 60.0), vec!["Library"]);
        assert!(index.suggest("", 3, 0.0).is_empty());
        assert!(index.suggest("qqqqqq", 3, 60.0).is_empty());
    }

    #[test]
    fn test_featured() {
        let catalog = campus();
        let index = SearchIndex::new(&catalog);
        let names: Vec<String> = ["cafeteria", "Observatory", "Library", "CAFETERIA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ids: Vec<u32> = index.featured(&names).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn test_fuzzy_score_bounds() {
        assert_eq!(fuzzy_score("abc", "abc"), 100.0);
        assert_eq!(fuzzy_score("", "abc"), 0.0);
        let s = fuzzy_score("rom 101", "room 101a");
        assert!(s > 70.0 && s < 80.0);
    }

    #[test]
    fn test_typo_in_one_word_of_long_name() {
        let s = fuzzy_score("regstrar", "registrar office");
        assert!(s > 80.0 && s < 100.0, "{}", s);
        let s = fuzzy_score("chemstry", "chemistry lab");
        assert!(s > 80.0, "{}", s);
        // A partial window never reaches a full substring score.
        assert!(fuzzy_score("registrer", "main registrar office") < 100.0);
    }

    #[test]
    fn test_typo_search_finds_multi_word_room() {
        let (catalog, _) = RoomCatalog::load(
            &[
                raw(1, "Library", "Central Block", "Ground"),
                raw(2, "Registrar Office", "Administration", "Ground"),
                raw(3, "Chemistry Lab", "Science Complex", "1"),
            ],
            &Bounds::WORLD,
        );
        let hits = search("regstrar", &catalog, 5, 60.0);
        assert_eq!(hits.first().map(|h| h.room.id), Some(2));
        let hits = search("chemstry", &catalog, 5, 60.0);
        assert_eq!(hits.first().map(|h| h.room.id), Some(3));
        assert!(search("zzz", &catalog, 5, 60.0).is_empty());
    }
}
