use crate::api::{ApiError, ProjectUpload};
use crate::event::{AppEvent, Dispatcher};
use crate::notify::Toasts;
use crate::project::{accept_files, Project, ProjectRegistry, SelectedFile};
use crate::validation::ValidationError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Snapshot of the form taken at submit time.
#[derive(Debug, Clone)]
struct Submission {
    name: String,
    files: Vec<SelectedFile>,
}

/// State of the create-project panel.
#[derive(Debug, Default)]
pub struct ProjectForm {
    pub name: String,
    pub path_input: String,
    files: Vec<SelectedFile>,
    in_flight: Option<Submission>,
}

impl ProjectForm {
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn is_creating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Adds every accepted file from `paths`; rejected kinds are dropped.
    /// Returns how many files were added.
    pub fn add_paths(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> usize {
        let accepted = accept_files(paths);
        let added = accepted.len();
        self.files.extend(accepted);
        added
    }

    /// Takes the typed path from the entry field, if any.
    pub fn add_typed_path(&mut self) -> usize {
        let raw = self.path_input.trim();
        if raw.is_empty() {
            return 0;
        }
        let path = PathBuf::from(raw);
        self.path_input.clear();
        self.add_paths([path])
    }

    pub fn remove_file(&mut self, index: usize) {
        if index < self.files.len() {
            self.files.remove(index);
        }
    }

    /// Discards entered data. Does nothing while a submission is in flight.
    pub fn reset(&mut self) {
        if self.is_creating() {
            return;
        }
        self.name.clear();
        self.path_input.clear();
        self.files.clear();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.files.is_empty() {
            return Err(ValidationError::NoFiles);
        }
        Ok(())
    }

    /// Validates and submits the form. Validation failures are reported as a
    /// single toast and never reach the backend.
    pub fn create_project(
        &mut self,
        dispatcher: &Dispatcher,
        toasts: &mut Toasts,
    ) -> Result<(), ValidationError> {
        if self.is_creating() {
            return Err(ValidationError::Busy);
        }
        if let Err(err) = self.validate() {
            toasts.validation_error(&err);
            return Err(err);
        }

        let submission = Submission {
            name: self.name.clone(),
            files: self.files.clone(),
        };
        let upload = ProjectUpload {
            project_id: submission.name.clone(),
            files: submission.files.clone(),
        };
        info!(name = %submission.name, files = submission.files.len(), "creating project");
        self.in_flight = Some(submission);

        dispatcher.spawn_request(move |api| async move {
            AppEvent::ProjectCreated {
                result: api.create_project(upload).await,
            }
        });
        Ok(())
    }

    /// Applies the upload outcome. Returns the new project's id on success;
    /// on failure the entered name and files stay in place for a retry.
    pub fn on_created(
        &mut self,
        result: Result<(), ApiError>,
        registry: &mut ProjectRegistry,
        toasts: &mut Toasts,
    ) -> Option<uuid::Uuid> {
        let Some(submission) = self.in_flight.take() else {
            debug!("ignoring upload result with no submission in flight");
            return None;
        };

        match result {
            Ok(()) => {
                let project = Project::new(submission.name, submission.files);
                let id = project.id;
                info!(project = %project.name, files = project.file_count, "project created");
                registry.push(project);
                self.reset();
                toasts.success("Project created successfully!");
                Some(id)
            }
            Err(err) => {
                toasts.api_error("create project", &err);
                None
            }
        }
    }
}
