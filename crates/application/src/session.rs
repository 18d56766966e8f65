//! Editing sessions and the coordinator service that owns them.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use adfstudio_core::{AppError, AppResult};
use adfstudio_domain::{
    DatasetTypeConfig, FieldCatalog, FieldType, FieldValue, FileTypeConfig, LINKED_SERVICE_FIELD,
    LinkedServiceSummary, NAME_FIELD, Parameter, ParameterSet, Record,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ports::{DatasetStore, LinkedServiceRegistry};
use crate::{mapper, validator, visibility};

/// Lifecycle of one editing session. Loading and saving are atomic
/// transitions; only the settled states are observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Fresh session with a blank record and no persisted counterpart.
    Empty,
    /// Record matches the persisted document.
    Ready,
    /// Record carries unsaved edits.
    Dirty,
    /// Session has been closed and left the registry.
    Closed,
}

/// One editing session: a record bound to a workspace file path.
#[derive(Debug, Clone)]
pub struct EditorSession {
    path: String,
    dataset_type: Option<String>,
    file_type: Option<String>,
    record: Record,
    state: SessionState,
}

impl EditorSession {
    fn blank(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dataset_type: None,
            file_type: None,
            record: Record::new(),
            state: SessionState::Empty,
        }
    }

    fn loaded(path: impl Into<String>, loaded: mapper::LoadedDataset) -> Self {
        Self {
            path: path.into(),
            dataset_type: loaded.dataset_type,
            file_type: loaded.file_type,
            record: loaded.record,
            state: SessionState::Ready,
        }
    }

    /// Returns the workspace-relative file path identifying the session.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the selected dataset type name.
    #[must_use]
    pub fn dataset_type(&self) -> Option<&str> {
        self.dataset_type.as_deref()
    }

    /// Returns the selected file type name.
    #[must_use]
    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }

    /// Returns the current record.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Returns the session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns whether the record carries unsaved edits.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state == SessionState::Dirty
    }

    fn mark_changed(&mut self) {
        self.state = SessionState::Dirty;
    }

    fn mark_saved(&mut self) {
        self.state = SessionState::Ready;
    }
}

/// Form state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSnapshot {
    /// Workspace-relative file path.
    pub path: String,
    /// Selected dataset type name.
    pub dataset_type: Option<String>,
    /// Selected file type name.
    pub file_type: Option<String>,
    /// Current record.
    pub record: Record,
    /// Keys of the currently visible type-specific fields.
    pub active_fields: BTreeSet<String>,
    /// Current validation errors.
    pub errors: Vec<String>,
    /// Whether the session carries unsaved edits.
    pub dirty: bool,
}

/// Outcome of a save request. A rejected record is not a transport error;
/// the session stays dirty and nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// Whether the document was written.
    pub saved: bool,
    /// Validation errors when the save was rejected.
    pub errors: Vec<String>,
}

/// Coordinator owning every open session, keyed by file path. Sessions for
/// distinct paths are independent; the catalog is shared and read-only.
pub struct EditorService {
    catalog: Arc<FieldCatalog>,
    store: Arc<dyn DatasetStore>,
    linked_services: Arc<dyn LinkedServiceRegistry>,
    sessions: RwLock<HashMap<String, EditorSession>>,
}

impl EditorService {
    /// Creates the service over its collaborating ports.
    #[must_use]
    pub fn new(
        catalog: Arc<FieldCatalog>,
        store: Arc<dyn DatasetStore>,
        linked_services: Arc<dyn LinkedServiceRegistry>,
    ) -> Self {
        Self {
            catalog,
            store,
            linked_services,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the shared field catalog.
    #[must_use]
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Opens a dataset file into a session. Opening an already-open path
    /// returns the existing session untouched. An unrecognized document
    /// shape loads only the identity fields.
    pub async fn open(&self, path: &str) -> AppResult<EditorSnapshot> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(path) {
            return Ok(self.snapshot_of(session));
        }

        let contents = self.store.read_text(path).await?;
        let document: Value = serde_json::from_str(contents.as_str()).map_err(|error| {
            AppError::Validation(format!("dataset file '{path}' is not valid JSON: {error}"))
        })?;

        let loaded = mapper::from_json(&self.catalog, &document);
        let session = EditorSession::loaded(path, loaded);
        let snapshot = self.snapshot_of(&session);
        sessions.insert(path.to_owned(), session);
        Ok(snapshot)
    }

    /// Starts a blank session for a file that does not exist yet.
    pub async fn create(&self, path: &str) -> AppResult<EditorSnapshot> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(path) {
            return Err(AppError::Conflict(format!(
                "a session for '{path}' is already open"
            )));
        }

        let session = EditorSession::blank(path);
        let snapshot = self.snapshot_of(&session);
        sessions.insert(path.to_owned(), session);
        Ok(snapshot)
    }

    /// Closes a session. Unsaved edits block the close unless forced.
    pub async fn close(&self, path: &str, force: bool) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(path)
            .ok_or_else(|| AppError::NotFound(format!("no open session for '{path}'")))?;

        if session.is_dirty() && !force {
            return Err(AppError::Conflict(format!(
                "session '{path}' has unsaved changes"
            )));
        }

        if let Some(mut session) = sessions.remove(path) {
            session.state = SessionState::Closed;
        }
        Ok(())
    }

    /// Selects the dataset type, resetting everything except the identity
    /// fields and seeding the new layout's defaults.
    pub async fn set_dataset_type(
        &self,
        path: &str,
        dataset_type: &str,
    ) -> AppResult<EditorSnapshot> {
        let config = self.catalog.find(dataset_type).ok_or_else(|| {
            AppError::Validation(format!("unknown dataset type '{dataset_type}'"))
        })?;

        let mut sessions = self.sessions.write().await;
        let session = Self::session_mut(&mut sessions, path)?;

        let identity: BTreeSet<&str> = [NAME_FIELD, LINKED_SERVICE_FIELD].into();
        session.record = retain_keys(&session.record, &identity);
        session.dataset_type = Some(dataset_type.to_owned());
        session.file_type = None;

        if !config.requires_file_type()
            && let Ok(scope) = config.scope(None)
        {
            mapper::seed_defaults(&scope, &mut session.record);
        }

        session.mark_changed();
        Ok(self.snapshot_of(session))
    }

    /// Selects the file type, keeping identity fields and the values of
    /// sections shared across file types.
    pub async fn set_file_type(&self, path: &str, file_type: &str) -> AppResult<EditorSnapshot> {
        let mut sessions = self.sessions.write().await;
        let session = Self::session_mut(&mut sessions, path)?;

        let dataset_type = session.dataset_type.clone().ok_or_else(|| {
            AppError::Validation("select a dataset type before a file type".to_owned())
        })?;
        let config = self
            .catalog
            .find(dataset_type.as_str())
            .ok_or_else(|| AppError::Internal(format!("dataset type '{dataset_type}' vanished")))?;
        if config.file_type(file_type).is_none() {
            return Err(AppError::Validation(format!(
                "unknown file type '{file_type}' for dataset type '{dataset_type}'"
            )));
        }

        let mut retained: BTreeSet<&str> = [NAME_FIELD, LINKED_SERVICE_FIELD].into();
        for section in config.sections() {
            retained.extend(section.fields().map(|(key, _)| key));
        }
        session.record = retain_keys(&session.record, &retained);
        session.file_type = Some(file_type.to_owned());

        if let Ok(scope) = config.scope(Some(file_type)) {
            mapper::seed_defaults(&scope, &mut session.record);
        }

        session.mark_changed();
        Ok(self.snapshot_of(session))
    }

    /// Applies one raw field-change event from the presentation layer.
    pub async fn change_field(
        &self,
        path: &str,
        key: &str,
        value: &Value,
    ) -> AppResult<EditorSnapshot> {
        let mut sessions = self.sessions.write().await;
        let session = Self::session_mut(&mut sessions, path)?;

        if key == NAME_FIELD || key == LINKED_SERVICE_FIELD {
            let text = scalar_input(value).ok_or_else(|| {
                AppError::Validation(format!("field '{key}' expects a text value"))
            })?;
            session.record.set(key, FieldValue::text(text));
            session.mark_changed();
            return Ok(self.snapshot_of(session));
        }

        let (config, file_type) = self.selection(session).ok_or_else(|| {
            AppError::Validation("select a dataset type before editing fields".to_owned())
        })?;
        let scope = config
            .scope(file_type.map(|f| f.type_name().as_str()))
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let def = scope
            .field(key)
            .ok_or_else(|| AppError::Validation(format!("unknown field '{key}'")))?;

        let coerced = match def.field_type() {
            FieldType::Boolean => FieldValue::Bool(boolean_input(value).ok_or_else(|| {
                AppError::Validation(format!("field '{}' expects a boolean value", def.label()))
            })?),
            FieldType::KeyvalueParameters => FieldValue::Parameters(parameters_input(value)?),
            _ => FieldValue::text(scalar_input(value).ok_or_else(|| {
                AppError::Validation(format!("field '{}' expects a text value", def.label()))
            })?),
        };
        session.record.set(key, coerced);

        // Only changes to fields with dependents can flip visibility.
        if scope.has_dependents(key) {
            visibility::apply_visibility(&scope, &mut session.record);
        }

        session.mark_changed();
        Ok(self.snapshot_of(session))
    }

    /// Toggles manual expression entry for a select-text field.
    pub async fn set_expression_mode(
        &self,
        path: &str,
        key: &str,
        enabled: bool,
    ) -> AppResult<EditorSnapshot> {
        let mut sessions = self.sessions.write().await;
        let session = Self::session_mut(&mut sessions, path)?;

        let (config, file_type) = self.selection(session).ok_or_else(|| {
            AppError::Validation("select a dataset type before editing fields".to_owned())
        })?;
        let scope = config
            .scope(file_type.map(|f| f.type_name().as_str()))
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let def = scope
            .field(key)
            .ok_or_else(|| AppError::Validation(format!("unknown field '{key}'")))?;
        if def.field_type() != FieldType::SelectText {
            return Err(AppError::Validation(format!(
                "field '{}' does not take manual expressions",
                def.label()
            )));
        }

        session.record.set_expression_mode(key, enabled);
        session.mark_changed();
        Ok(self.snapshot_of(session))
    }

    /// Validates and persists the session. A rejected record surfaces its
    /// error list without touching the file; a store failure surfaces
    /// verbatim with the record and dirty flag intact.
    pub async fn save(&self, path: &str) -> AppResult<SaveOutcome> {
        let mut sessions = self.sessions.write().await;
        let session = Self::session_mut(&mut sessions, path)?;

        let report = validator::validate(
            &self.catalog,
            session.dataset_type(),
            session.file_type(),
            &session.record,
        );
        if !report.is_valid() {
            return Ok(SaveOutcome {
                saved: false,
                errors: report.into_errors(),
            });
        }

        let (config, file_type) = self
            .selection(session)
            .ok_or_else(|| AppError::Internal("validated session lost its type".to_owned()))?;
        let scope = config
            .scope(file_type.map(|f| f.type_name().as_str()))
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let document = mapper::to_json(config, file_type, &scope, &session.record);
        let mut contents = serde_json::to_string_pretty(&document)
            .map_err(|error| AppError::Internal(error.to_string()))?;
        contents.push('\n');

        self.store.write_text(path, contents.as_str()).await?;
        session.mark_saved();
        Ok(SaveOutcome {
            saved: true,
            errors: Vec::new(),
        })
    }

    /// Returns the current form state for one session.
    pub async fn snapshot(&self, path: &str) -> AppResult<EditorSnapshot> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(path)
            .ok_or_else(|| AppError::NotFound(format!("no open session for '{path}'")))?;
        Ok(self.snapshot_of(session))
    }

    /// Lists the dataset definition files of the workspace.
    pub async fn list_datasets(&self) -> AppResult<Vec<String>> {
        self.store.list_json_files("dataset").await
    }

    /// Returns the linked services a dataset type may reference.
    pub async fn linked_service_options(
        &self,
        dataset_type: &str,
    ) -> AppResult<Vec<LinkedServiceSummary>> {
        let config = self.catalog.find(dataset_type).ok_or_else(|| {
            AppError::NotFound(format!("unknown dataset type '{dataset_type}'"))
        })?;

        let services = self.linked_services.list_services().await?;
        Ok(services
            .into_iter()
            .filter(|service| {
                config.allows_linked_service_type(service.service_type().as_str())
            })
            .collect())
    }

    fn session_mut<'a>(
        sessions: &'a mut HashMap<String, EditorSession>,
        path: &str,
    ) -> AppResult<&'a mut EditorSession> {
        sessions
            .get_mut(path)
            .ok_or_else(|| AppError::NotFound(format!("no open session for '{path}'")))
    }

    fn selection(
        &self,
        session: &EditorSession,
    ) -> Option<(&DatasetTypeConfig, Option<&FileTypeConfig>)> {
        let config = self.catalog.find(session.dataset_type()?)?;
        match session.file_type() {
            Some(name) => config.file_type(name).map(|file_type| (config, Some(file_type))),
            None if config.requires_file_type() => None,
            None => Some((config, None)),
        }
    }

    fn snapshot_of(&self, session: &EditorSession) -> EditorSnapshot {
        let active_fields = self
            .selection(session)
            .and_then(|(config, file_type)| {
                config
                    .scope(file_type.map(|f| f.type_name().as_str()))
                    .ok()
                    .map(|scope| visibility::active_fields(&scope, &session.record))
            })
            .unwrap_or_default();

        let report = validator::validate(
            &self.catalog,
            session.dataset_type(),
            session.file_type(),
            &session.record,
        );

        EditorSnapshot {
            path: session.path().to_owned(),
            dataset_type: session.dataset_type().map(str::to_owned),
            file_type: session.file_type().map(str::to_owned),
            record: session.record.clone(),
            active_fields,
            errors: report.into_errors(),
            dirty: session.is_dirty(),
        }
    }
}

fn retain_keys(record: &Record, keys: &BTreeSet<&str>) -> Record {
    let mut retained = Record::new();
    for key in keys.iter().copied() {
        if let Some(value) = record.get(key) {
            retained.set(key, value.clone());
        }
        if record.is_expression(key) {
            retained.set_expression_mode(key, true);
        }
    }
    retained
}

fn scalar_input(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(state) => Some(state.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn boolean_input(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(state) => Some(*state),
        Value::String(text) => text.parse::<bool>().ok(),
        _ => None,
    }
}

fn parameters_input(value: &Value) -> AppResult<ParameterSet> {
    let entries = value.as_array().ok_or_else(|| {
        AppError::Validation("parameters expect a list of name/type/default entries".to_owned())
    })?;

    let mut parameters = ParameterSet::new();
    for entry in entries {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Validation("parameter entry is missing 'name'".to_owned()))?;
        let parameter_type = entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string");
        let default_value = entry
            .get("defaultValue")
            .and_then(Value::as_str)
            .unwrap_or_default();
        parameters.insert(Parameter::new(name, parameter_type, default_value)?)?;
    }
    Ok(parameters)
}
