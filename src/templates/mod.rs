use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use crate::{
    elements::ElementSet,
    errors::{AppError, Result},
};

/// Writes `elements` as an indented JSON object keyed by the eight element
/// names. The write is neither atomic nor locked; the last writer wins.
pub async fn save(elements: &ElementSet, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let body = serde_json::to_string_pretty(elements).map_err(|err| AppError::template(path, err))?;

    fs::write(path, body).await.map_err(|err| {
        warn!(target: "templates", path = ?path, error = ?err, "failed to write template");
        AppError::template(path, err)
    })?;

    debug!(target: "templates", path = ?path, "template saved");
    Ok(())
}

/// Reads a template written by [`save`]. Missing keys load as empty strings;
/// any key outside the eight element names fails the whole load.
pub async fn load(path: impl AsRef<Path>) -> Result<ElementSet> {
    let path = path.as_ref();
    let body = fs::read_to_string(path)
        .await
        .map_err(|err| AppError::template(path, err))?;

    let elements = serde_json::from_str::<ElementSet>(&body).map_err(|err| {
        warn!(target: "templates", path = ?path, error = %err, "rejected template");
        AppError::template(path, err)
    })?;

    debug!(target: "templates", path = ?path, "template loaded");
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ElementSet {
        ElementSet {
            subject: "חתול פרסי לבן".into(),
            composition: "close-up portrait".into(),
            style: "oil painting".into(),
            lighting: String::new(),
            color: "ochre, umber".into(),
            mood: "calm".into(),
            details: "\"quoted\" whiskers".into(),
            context: "gallery print".into(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.json");

        save(&sample(), &path).await.unwrap();
        let loaded = load(&path).await.unwrap();

        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn saved_file_is_readable_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.json");
        save(&sample(), &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"subject\": \"חתול פרסי לבן\""));
        assert!(raw.find("\"subject\"").unwrap() < raw.find("\"context\"").unwrap());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.json");
        save(&ElementSet::with_subject("first"), &path).await.unwrap();
        save(&ElementSet::with_subject("second"), &path).await.unwrap();

        assert_eq!(load(&path).await.unwrap().subject, "second");
    }

    #[tokio::test]
    async fn partial_file_defaults_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"subject": "fox", "mood": "playful"}"#).unwrap();

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.subject, "fox");
        assert_eq!(loaded.mood, "playful");
        assert!(loaded.style.is_empty());
    }

    #[tokio::test]
    async fn unknown_key_fails_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extra.json");
        std::fs::write(&path, r#"{"subject": "fox", "lens": "85mm"}"#).unwrap();

        let err = load(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Template { .. }));
    }

    #[tokio::test]
    async fn invalid_json_and_missing_file_fail() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();

        assert!(matches!(load(&broken).await, Err(AppError::Template { .. })));
        assert!(matches!(
            load(dir.path().join("absent.json")).await,
            Err(AppError::Template { .. })
        ));
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/t.json");
        assert!(matches!(
            save(&sample(), &path).await,
            Err(AppError::Template { .. })
        ));
    }
}
