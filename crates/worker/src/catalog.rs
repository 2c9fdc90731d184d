//! Loading the seed catalog for the in-memory store.

use std::path::Path;

use questline_db::store::Catalog;

use crate::error::WorkerError;

/// Read and validate a JSON catalog of achievements and quests.
pub fn load_catalog(path: &Path) -> Result<Catalog, WorkerError> {
    let raw = std::fs::read_to_string(path)?;
    parse_catalog(&raw)
}

pub fn parse_catalog(raw: &str) -> Result<Catalog, WorkerError> {
    let catalog: Catalog = serde_json::from_str(raw)?;
    catalog.validate()?;
    tracing::info!(
        achievements = catalog.achievements.len(),
        quests = catalog.quests.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use questline_core::error::CoreError;

    use super::*;

    const CATALOG: &str = r#"{
        "achievements": [
            {
                "id": 1,
                "title": "First Steps",
                "category": "learning",
                "xpReward": 50,
                "criteria": { "type": "lessons_completed", "target": 1 }
            }
        ],
        "quests": [
            {
                "id": 10,
                "title": "Lesson sprint",
                "type": "daily",
                "objectives": [ { "type": "lessons_completed", "target": 3 } ],
                "rewards": { "xp": 20 }
            }
        ]
    }"#;

    #[test]
    fn parses_a_catalog() {
        let catalog = parse_catalog(CATALOG).unwrap();
        assert_eq!(catalog.achievements.len(), 1);
        assert!(catalog.achievements[0].is_active);
        assert_eq!(catalog.quests[0].objectives[0].criteria.target, 3);
        assert_eq!(catalog.quests[0].rewards.total_xp(), 20);
    }

    #[test]
    fn rejects_invalid_definitions() {
        let raw = CATALOG.replace("\"First Steps\"", "\"Hi\"");
        assert_matches!(
            parse_catalog(&raw),
            Err(WorkerError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert_matches!(parse_catalog("{"), Err(WorkerError::Serialization(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert_matches!(
            load_catalog(Path::new("/nonexistent/catalog.json")),
            Err(WorkerError::Io(_))
        );
    }
}
