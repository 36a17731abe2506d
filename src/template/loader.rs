//! Template discovery and loading from a directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{LayoutTemplate, PlaceholderTemplate, Template};
use crate::error::{LabelerError, Result};

/// File name of the seeded stock template.
pub const DEFAULT_TEMPLATE_FILE: &str = "default_2x2.json";

/// Loads templates from one directory.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the stock template if the directory does not have one yet.
    ///
    /// Returns its path either way.
    pub fn ensure_default(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(DEFAULT_TEMPLATE_FILE);
        if !path.exists() {
            let json = serde_json::to_string_pretty(&Template::default_2x2())
                .map_err(|e| LabelerError::Template(e.to_string()))?;
            fs::write(&path, json)?;
            info!(path = %path.display(), "Seeded default template");
        }
        Ok(path)
    }

    /// Sorted template file names. A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if template_kind(Path::new(&name)).is_some() && entry.path().is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// # Load by Name
    ///
    /// `name` is a file name (`default_2x2.json`) or its stem
    /// (`default_2x2`).
    ///
    /// ## Errors
    ///
    /// - `MissingTemplate` if `name` is blank or matches no file
    /// - `Template` if a JSON template does not parse
    pub fn load(&self, name: &str) -> Result<LayoutTemplate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LabelerError::MissingTemplate("no template selected".into()));
        }

        let direct = self.dir.join(name);
        if template_kind(&direct).is_some() && direct.is_file() {
            return load_path(&direct);
        }

        let by_stem = self
            .list()?
            .into_iter()
            .find(|file| Path::new(file).file_stem().is_some_and(|stem| stem == name));
        match by_stem {
            Some(file) => load_path(&self.dir.join(file)),
            None => Err(LabelerError::MissingTemplate(name.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Json,
    Prn,
}

fn template_kind(path: &Path) -> Option<Kind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(Kind::Json),
        "prn" => Some(Kind::Prn),
        _ => None,
    }
}

/// Load a template file, choosing the kind from its extension.
pub fn load_path(path: &Path) -> Result<LayoutTemplate> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match template_kind(path) {
        Some(Kind::Json) => {
            let raw = fs::read(path).map_err(|e| missing_or_io(path, e))?;
            let mut template: Template = serde_json::from_slice(&raw)
                .map_err(|e| LabelerError::Template(format!("{}: {}", path.display(), e)))?;
            if template.name.trim().is_empty() {
                template.name = stem;
            }
            template.source_dir = path.parent().map(Path::to_path_buf);
            debug!(template = %template.name, fields = template.fields.len(), "Loaded vector template");
            Ok(LayoutTemplate::Vector(template))
        }
        Some(Kind::Prn) => {
            let raw = fs::read(path).map_err(|e| missing_or_io(path, e))?;
            debug!(template = %stem, bytes = raw.len(), "Loaded placeholder template");
            Ok(LayoutTemplate::Placeholder(PlaceholderTemplate {
                name: stem,
                text: decode_text(&raw),
            }))
        }
        None => Err(LabelerError::Template(format!(
            "{}: expected a .json or .prn template",
            path.display()
        ))),
    }
}

fn missing_or_io(path: &Path, e: std::io::Error) -> LabelerError {
    if e.kind() == std::io::ErrorKind::NotFound {
        LabelerError::MissingTemplate(path.display().to_string())
    } else {
        e.into()
    }
}

/// UTF-8 with invalid sequences dropped.
fn decode_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::EmitMode;

    #[test]
    fn test_ensure_default_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let loader = TemplateLoader::new(dir.path().join("templates"));

        let path = loader.ensure_default().unwrap();
        fs::write(&path, r#"{"name": "edited"}"#).unwrap();
        loader.ensure_default().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"name": "edited"}"#);
    }

    #[test]
    fn test_seeded_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let loader = TemplateLoader::new(dir.path());
        loader.ensure_default().unwrap();

        let LayoutTemplate::Vector(t) = loader.load("default_2x2").unwrap() else {
            panic!("expected vector template");
        };
        assert_eq!(t.fields, Template::default_2x2().fields);
        assert_eq!(t.source_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.prn", "a.json", "notes.txt", "C.PRN"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("sub.json")).unwrap();

        let loader = TemplateLoader::new(dir.path());
        assert_eq!(loader.list().unwrap(), ["C.PRN", "a.json", "b.prn"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let loader = TemplateLoader::new("/no/such/templates/dir");
        assert!(loader.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_prn_drops_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("turkey.prn"), b"A10,10,0,3,1,1,N,\"{weight}\xff\"\nP1\n").unwrap();

        let loader = TemplateLoader::new(dir.path());
        let LayoutTemplate::Placeholder(t) = loader.load("turkey.prn").unwrap() else {
            panic!("expected placeholder template");
        };
        assert_eq!(t.name, "turkey");
        assert_eq!(t.text, "A10,10,0,3,1,1,N,\"{weight}\"\nP1\n");
    }

    #[test]
    fn test_name_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("deli.json"), r#"{"emit": "vector", "fields": []}"#).unwrap();

        let loaded = TemplateLoader::new(dir.path()).load("deli").unwrap();
        assert_eq!(loaded.name(), "deli");
        assert_eq!(loaded.as_vector().unwrap().emit, EmitMode::Vector);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let loader = TemplateLoader::new(dir.path());

        assert!(matches!(loader.load(""), Err(LabelerError::MissingTemplate(_))));
        assert!(matches!(loader.load("absent"), Err(LabelerError::MissingTemplate(_))));
        assert!(matches!(loader.load("broken.json"), Err(LabelerError::Template(_))));
    }
}
