// File: src/persistence.rs
use crate::core::engine::CategoryEngine;
use crate::core::types::CompiledIndex;
use crate::core::vocabulary::Vocabulary;
use crate::error::PersistenceError;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufReader, BufWriter, Error, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Everything needed to answer queries without rebuilding.
#[derive(serde::Serialize, serde::Deserialize)]
struct Snapshot {
    /// Hash of the vocabulary and raw dictionary the index was built from.
    fingerprint: Option<u64>,
    vocabulary: Vocabulary,
    index: CompiledIndex,
}

/// Identifies a build input pair. Equal inputs give equal fingerprints
/// across processes.
pub fn source_fingerprint(vocabulary: &Vocabulary, raw: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    vocabulary.hash(&mut hasher);
    raw.to_string().hash(&mut hasher);
    hasher.finish()
}

/// Atomically writes a built engine to `path`.
pub fn save_to_disk(engine: &CategoryEngine, path: &Path) -> Result<(), PersistenceError> {
    let index = engine.index.as_ref().ok_or(PersistenceError::Unbuilt)?;

    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let snapshot = Snapshot {
        fingerprint: engine.fingerprint,
        vocabulary: engine.vocabulary.clone(),
        index: index.clone(),
    };

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    let mut writer = BufWriter::new(&temp_file);
    bincode::serialize_into(&mut writer, &snapshot)?;
    writer.flush()?;
    drop(writer);

    temp_file.persist(path)?;
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<CategoryEngine, PersistenceError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;

    snapshot
        .vocabulary
        .validate()
        .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
    if let Some(category) = snapshot
        .index
        .categories()
        .find(|c| !snapshot.vocabulary.is_member(c.as_str()))
    {
        return Err(PersistenceError::ForeignCategory(category.to_string()));
    }

    Ok(CategoryEngine {
        vocabulary: snapshot.vocabulary,
        index: Some(snapshot.index),
        fingerprint: snapshot.fingerprint,
    })
}

/// Loads the snapshot only if it was built from inputs with `expected`
/// fingerprint.
pub fn load_matching(path: &Path, expected: u64) -> Result<CategoryEngine, PersistenceError> {
    let engine = load_from_disk(path)?;
    if engine.fingerprint != Some(expected) {
        return Err(PersistenceError::Stale);
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_restores_identical_answers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("categorias.bin");

        let raw = json!({
            "Tomate Italiano": "hortifruti",
            "Tomate Pelado Lata": "mercearia",
            "Desinfetante Pinho": "mat limpeza"
        });
        let engine = CategoryEngine::build(Vocabulary::builtin().clone(), &raw).unwrap();
        save_to_disk(&engine, &path).unwrap();

        let restored = load_from_disk(&path).unwrap();
        assert!(restored.is_built());
        for q in ["tomate italiano", "tomate cereja", "desinfetante pinho", "cr dental colgate", "nada"] {
            assert_eq!(restored.explain(q), engine.explain(q), "{q:?}");
        }
        let order = |e: &CategoryEngine| -> Vec<String> {
            e.index().unwrap().keyword_rules.iter().map(|r| r.keyword.clone()).collect()
        };
        assert_eq!(order(&restored), order(&engine));
    }

    #[test]
    fn unbuilt_engine_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CategoryEngine::unbuilt(Vocabulary::builtin().clone());
        let result = save_to_disk(&engine, &dir.path().join("x.bin"));
        assert!(matches!(result, Err(PersistenceError::Unbuilt)));
    }

    #[test]
    fn garbage_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(load_from_disk(&path).is_err());
    }

    fn garden_vocabulary() -> Vocabulary {
        Vocabulary::from_json_str(
            r#"{
                "categories": ["hortalicas", "outros"],
                "fallback": "outros",
                "legacy_remap": { "hortifruti": "hortalicas" }
            }"#,
        )
        .unwrap()
    }

    fn tomato_raw() -> Value {
        json!({ "Tomate Italiano": "hortifruti", "Alface Crespa": "hortifruti" })
    }

    #[test]
    fn snapshot_built_from_other_vocabulary_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorias.bin");

        let first = CategoryEngine::from_snapshot_or_build(&path, Vocabulary::builtin().clone(), &tomato_raw());
        assert_eq!(first.classify("tomate cereja"), "feira");
        assert!(path.exists());

        let second = CategoryEngine::from_snapshot_or_build(&path, garden_vocabulary(), &tomato_raw());
        assert_eq!(second.classify("tomate cereja"), "hortalicas");
        let names: Vec<&str> = second.vocabulary().categories().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["hortalicas", "outros"]);

        // The rebuild replaced the snapshot on disk.
        let expected = source_fingerprint(&garden_vocabulary(), &tomato_raw());
        assert!(load_matching(&path, expected).is_ok());
    }

    #[test]
    fn snapshot_built_from_other_dictionary_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorias.bin");
        let vocabulary = Vocabulary::builtin().clone();

        let first = CategoryEngine::from_snapshot_or_build(&path, vocabulary.clone(), &tomato_raw());
        assert_eq!(first.classify("vassoura pelo"), "outros");

        let mut raw = tomato_raw();
        raw["Vassoura Pelo"] = json!("bazar");
        let second = CategoryEngine::from_snapshot_or_build(&path, vocabulary, &raw);
        assert_eq!(second.explain("vassoura pelo").stage, crate::MatchStage::Dictionary);
        assert_eq!(second.classify("vassoura pelo"), "utilidades");
    }

    #[test]
    fn matching_snapshot_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorias.bin");
        let vocabulary = Vocabulary::builtin().clone();
        let expected = source_fingerprint(&vocabulary, &tomato_raw());

        let engine = CategoryEngine::build(vocabulary.clone(), &tomato_raw()).unwrap();
        assert_eq!(engine.fingerprint(), Some(expected));
        save_to_disk(&engine, &path).unwrap();

        assert!(load_matching(&path, expected).is_ok());
        assert!(matches!(
            load_matching(&path, expected.wrapping_add(1)),
            Err(PersistenceError::Stale)
        ));
    }

    #[test]
    fn fingerprint_ignores_map_iteration_order() {
        let json = r#"{
            "categories": ["carnes", "feira", "outros"],
            "fallback": "outros",
            "stopwords": ["de", "kg", "com"],
            "legacy_remap": { "acougue": "carnes", "hortifruti": "feira", "aves": "carnes" }
        }"#;
        let a = Vocabulary::from_json_str(json).unwrap();
        let b = Vocabulary::from_json_str(json).unwrap();
        let raw = tomato_raw();
        assert_eq!(source_fingerprint(&a, &raw), source_fingerprint(&b, &raw));
        assert_ne!(
            source_fingerprint(&a, &raw),
            source_fingerprint(&garden_vocabulary(), &raw)
        );
    }

    #[test]
    fn snapshot_with_foreign_categories_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.bin");

        let garden = CategoryEngine::build(garden_vocabulary(), &tomato_raw()).unwrap();
        let snapshot = Snapshot {
            fingerprint: None,
            vocabulary: Vocabulary::builtin().clone(),
            index: garden.index().unwrap().clone(),
        };
        fs::write(&path, bincode::serialize(&snapshot).unwrap()).unwrap();

        match load_from_disk(&path) {
            Err(PersistenceError::ForeignCategory(category)) => assert_eq!(category, "hortalicas"),
            other => panic!("expected ForeignCategory, got {other:?}"),
        }
    }
}
