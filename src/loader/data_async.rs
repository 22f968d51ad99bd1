//! Async class data file loading
//!
//! The CLI reads the data file and an optional config file concurrently
//! on the tokio runtime; parsing happens on the blocking pool since large
//! rosters with long inventories are not free to decode.

use crate::config::SessionConfig;
use crate::loader::class_data::ClassData;
use crate::Result;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

/// Read and parse a data file; a missing file yields `None`
pub async fn load_class_data(path: &Path) -> Result<Option<(ClassData, std::time::Duration)>> {
    let start = Instant::now();
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(path).await?;
    let data = tokio::task::spawn_blocking(move || ClassData::from_json(&json)).await??;
    Ok(Some((data, start.elapsed())))
}

/// Write a data file, creating parent directories as needed
pub async fn save_class_data(path: &Path, data: &ClassData) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let json = data.to_json()?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Read a JSON config file, or the defaults when no path is given
pub async fn load_config(path: Option<PathBuf>) -> Result<SessionConfig> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path).await?;
            SessionConfig::from_json(&json)
        }
        None => Ok(SessionConfig::default()),
    }
}

/// Load a config file (if given) and the data file in parallel
///
/// The data file path comes from the config unless `data_override` is set.
pub async fn load_workspace(
    config_path: Option<PathBuf>,
    data_override: Option<PathBuf>,
) -> Result<(SessionConfig, Option<ClassData>)> {
    let config_task = tokio::spawn(load_config(config_path));

    // The data path may depend on the config, so only prefetch when overridden
    let data_task = data_override
        .clone()
        .map(|path| tokio::spawn(async move { load_class_data(&path).await }));

    let mut config = config_task.await??;
    if let Some(path) = data_override {
        config.data_file = path;
    }

    let data = match data_task {
        Some(task) => task.await??,
        None => load_class_data(&config.data_file).await?,
    };

    Ok((config, data.map(|(data, _)| data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::class_data::demo_students;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gacha-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let path = temp_path("missing.json");
        assert!(load_class_data(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = temp_path("class.json");
        let data = ClassData::new(demo_students(4));
        save_class_data(&path, &data).await.unwrap();

        let (loaded, _) = load_class_data(&path).await.unwrap().unwrap();
        assert_eq!(loaded, data);
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_workspace_override_wins() {
        let path = temp_path("override.json");
        save_class_data(&path, &ClassData::new(demo_students(0))).await.unwrap();

        let (config, data) = load_workspace(None, Some(path.clone())).await.unwrap();
        assert_eq!(config.data_file, path);
        assert_eq!(data.unwrap().students.len(), 28);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
