use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use flapevo_engine::CourseConfig;
use flapevo_training::SavedPolicy;

/// JSON documents the CLI reads or writes, as named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum FileKind {
    #[display("saved policy")]
    SavedPolicy,
    #[display("course config")]
    CourseConfig,
}

/// Destination of a JSON document.
///
/// File output goes to a `.part` sibling first and is renamed over the target
/// once the document is complete, so a failed save keeps the previous file.
#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        staging: PathBuf,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(
        kind: FileKind,
        value: &T,
        output_path: Option<PathBuf>,
    ) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        Output::from_output_path(output_path)?.write_json(kind, value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    /// Prepares to write `path`, creating any missing parent directories.
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let staging = staging_path(&path);
        let file = File::create(&staging)
            .with_context(|| format!("Failed to create output file: {}", staging.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            staging,
            path,
        })
    }

    pub fn write_json<T>(self, kind: FileKind, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        match self {
            Output::Stdout { mut writer } => write_pretty(&mut writer, value)
                .with_context(|| format!("Failed to write {kind} to stdout")),
            Output::File {
                mut writer,
                staging,
                path,
            } => {
                let written = write_pretty(&mut writer, value);
                drop(writer);
                if written.is_err() {
                    // Best effort; the target itself is untouched.
                    let _ = fs::remove_file(&staging);
                }
                written.with_context(|| format!("Failed to write {kind} to {}", path.display()))?;
                fs::rename(&staging, &path).with_context(|| {
                    format!("Failed to move {kind} into place: {}", path.display())
                })
            }
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(OsString::new, OsString::from);
    name.push(".part");
    path.with_file_name(name)
}

fn write_pretty<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: io::Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

pub fn read_json_file<T, P>(kind: FileKind, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open {kind} file: {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {kind} JSON file: {}", path.display()))
}

/// Read a saved policy from a JSON file
///
/// # Errors
///
/// Returns error if file cannot be opened or parsed
pub fn read_saved_policy_file<P>(path: P) -> anyhow::Result<SavedPolicy>
where
    P: AsRef<Path>,
{
    read_json_file(FileKind::SavedPolicy, path)
}

/// Read a course configuration from a JSON file
///
/// Fields missing from the file keep their default values.
pub fn read_config_file<P>(path: P) -> anyhow::Result<CourseConfig>
where
    P: AsRef<Path>,
{
    read_json_file(FileKind::CourseConfig, path)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use flapevo_engine::{NodeCounts, ParameterBlob, ParameterGroup};

    use super::*;

    fn saved_policy() -> SavedPolicy {
        SavedPolicy {
            name: "test".to_owned(),
            trained_at: "2026-03-04T05:06:07Z".parse().unwrap(),
            generation: 3,
            score: 9,
            fitness: 812.5,
            node_counts: NodeCounts::DEFAULT,
            parameters: ParameterBlob::new(vec![
                ParameterGroup::new(vec![2, 2], vec![0.1, -0.2, 0.3, -0.4]).unwrap(),
            ]),
        }
    }

    #[test]
    fn test_saved_policy_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/best.json");
        let saved = saved_policy();

        Output::save_json(FileKind::SavedPolicy, &saved, Some(path.clone())).unwrap();
        let loaded = read_saved_policy_file(&path).unwrap();
        assert_eq!(loaded, saved);
        assert!(!dir.path().join("nested/best.json.part").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");
        let saved = saved_policy();
        Output::save_json(FileKind::SavedPolicy, &saved, Some(path.clone())).unwrap();

        // JSON object keys must be strings.
        let unwritable = BTreeMap::from([(vec![1_u8], 2_u8)]);
        let err = Output::save_json(FileKind::SavedPolicy, &unwritable, Some(path.clone()))
            .unwrap_err();
        assert!(format!("{err:#}").contains("saved policy"), "{err:#}");

        assert_eq!(read_saved_policy_file(&path).unwrap(), saved);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_missing_file_reports_kind_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let message = format!("{:#}", read_saved_policy_file(&path).unwrap_err());
        assert!(message.contains("saved policy"), "{message}");
        assert!(message.contains("missing.json"), "{message}");

        let message = format!("{:#}", read_config_file(&path).unwrap_err());
        assert!(message.contains("course config"), "{message}");
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.json");
        fs::write(&path, r#"{ "gap_height": 150.0, "frame_rate": 30.0 }"#).unwrap();

        let config = read_config_file(&path).unwrap();
        assert_eq!(config.gap_height, 150.0);
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.width, CourseConfig::default().width);
    }
}
