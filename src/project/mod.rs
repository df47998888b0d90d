use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub mod form;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    PlainText,
}

impl MediaKind {
    /// Guesses the media kind from the file extension. Only documents and
    /// plain text are accepted; everything else yields `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        mime_guess::from_path(path)
            .iter()
            .find_map(|mime| match mime.essence_str() {
                "application/pdf" => Some(Self::Pdf),
                "text/plain" => Some(Self::PlainText),
                _ => None,
            })
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::PlainText => "TXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub media: MediaKind,
}

impl SelectedFile {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let media = MediaKind::from_path(&path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Some(Self { path, name, media })
    }
}

/// Keeps only the files whose media kind is accepted. Rejected files are
/// dropped without a report.
pub fn accept_files(paths: impl IntoIterator<Item = PathBuf>) -> Vec<SelectedFile> {
    paths.into_iter().filter_map(SelectedFile::from_path).collect()
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub file_count: usize,
    pub files: Vec<SelectedFile>,
    pub created_at: DateTime<Local>,
}

impl Project {
    pub fn new(name: String, files: Vec<SelectedFile>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            file_count: files.len(),
            files,
            created_at: Local::now(),
        }
    }

    pub fn file_count_label(&self) -> String {
        if self.file_count == 1 {
            "1 file".to_string()
        } else {
            format!("{} files", self.file_count)
        }
    }

    pub fn created_label(&self) -> String {
        format!("Created {}", self.created_at.format("%Y-%m-%d"))
    }
}

/// In-memory, append-only list of created projects.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
}

impl ProjectRegistry {
    pub fn push(&mut self, project: Project) {
        self.projects.push(project);
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
