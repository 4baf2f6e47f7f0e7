//! The live metadata model.
//!
//! One [`MetadataModel`] wraps one metadata text in either syntax. Loading
//! text parses it into tracked entries; every setter rewrites the smallest
//! region of text that realizes the change, so author formatting and
//! comments survive. Readers always see values consistent with the current
//! text, even after a partially failed parse.

use std::collections::HashMap;

use modfile_common::{empty_to_none, trim_to_none, Diagnostic, DiagnosticSink, ModuleName};
use modfile_parser::{
    parse_metadata, parse_metadata_json, parse_modulefile, serializer_for, Arg, CallRecorder,
    CallSymbol, Metadata, ParseResult, ShapeKind, SourceSpan, SourceSyntax, Value, ValueSerializer,
};
use tracing::debug;

use crate::document::{PositionId, Span, TextDocument};
use crate::entries::{ArgEntry, CallEntry, DependencyInfo, ItemEntry, ItemRepr, OsSupportInfo};
use crate::errors::{EditorError, EditorResult};
use crate::planner;
use crate::resolver::{AcceptAll, DependencyResolver};

/// Lifecycle of a model with respect to its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// No document loaded yet.
    Empty,
    /// Last load parsed; entries reflect the text.
    Valid,
    /// Last load hit a hard syntax error; entries cover the prefix that
    /// did parse.
    SyntaxError,
}

pub struct MetadataModel {
    document: TextDocument,
    syntax: SourceSyntax,
    resolver: Box<dyn DependencyResolver>,
    calls: HashMap<CallSymbol, CallEntry>,
    dependencies: Vec<ItemEntry>,
    os_supports: Vec<ItemEntry>,
    state: ModelState,
    dependency_errors: bool,
}

/// The diagnostic text for a dependency no resolver could satisfy.
pub fn unresolved_message(name: &str, version_requirement: &str) -> String {
    match trim_to_none(version_requirement) {
        Some(req) => format!("Unresolved dependency '{name}' ({req})"),
        None => format!("Unresolved dependency '{name}'"),
    }
}

impl MetadataModel {
    pub fn new(syntax: SourceSyntax) -> Self {
        Self::with_resolver(syntax, Box::new(AcceptAll))
    }

    pub fn with_resolver(syntax: SourceSyntax, resolver: Box<dyn DependencyResolver>) -> Self {
        Self {
            document: TextDocument::default(),
            syntax,
            resolver,
            calls: HashMap::new(),
            dependencies: Vec::new(),
            os_supports: Vec::new(),
            state: ModelState::Empty,
            dependency_errors: false,
        }
    }

    pub fn syntax(&self) -> SourceSyntax {
        self.syntax
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_syntax_error(&self) -> bool {
        self.state == ModelState::SyntaxError
    }

    pub fn has_dependency_errors(&self) -> bool {
        self.dependency_errors
    }

    /// The full current text, reflecting every edit so far.
    pub fn text(&self) -> &str {
        self.document.text()
    }

    /// Replaces the model's text wholesale: previous entries are dropped,
    /// the new text is parsed, and dependencies are re-resolved. Parse and
    /// resolution problems go to `diagnostics`; a hard syntax error leaves
    /// the model in [`ModelState::SyntaxError`] with whatever prefix
    /// parsed.
    pub fn set_document(&mut self, text: impl Into<String>, diagnostics: &mut dyn DiagnosticSink) {
        self.document = TextDocument::new(text);
        self.calls.clear();
        self.dependencies.clear();
        self.os_supports.clear();
        self.dependency_errors = false;
        self.state = ModelState::Valid;
        debug!(syntax = ?self.syntax, bytes = self.document.len(), "loading metadata document");

        let mut recorder = CallRecorder::new();
        let result = match self.syntax {
            SourceSyntax::Modulefile => {
                parse_modulefile(self.document.text(), &mut recorder, diagnostics)
            }
            SourceSyntax::MetadataJson => {
                parse_metadata_json(self.document.text(), &mut recorder, diagnostics)
            }
        };
        if let Err(error) = result {
            self.state = ModelState::SyntaxError;
            let line = self.document.line_of_offset(error.pos());
            diagnostics.report(Diagnostic::error(error.to_string()).at_line(line));
        }
        for call in recorder.calls {
            self.add_call(call.symbol, call.span, call.args);
        }
        self.resolve_dependencies(diagnostics);
    }

    /// Runs the strict parse over the current text.
    pub fn validate(&self, diagnostics: &mut dyn DiagnosticSink) -> ParseResult<Metadata> {
        parse_metadata(self.document.text(), self.syntax, diagnostics)
    }

    // ---- readers ----

    pub fn module_name(&self) -> String {
        self.scalar_value(CallSymbol::Name)
    }

    pub fn version(&self) -> String {
        self.scalar_value(CallSymbol::Version)
    }

    pub fn author(&self) -> String {
        self.scalar_value(CallSymbol::Author)
    }

    pub fn summary(&self) -> String {
        self.scalar_value(CallSymbol::Summary)
    }

    pub fn license(&self) -> String {
        self.scalar_value(CallSymbol::License)
    }

    pub fn source(&self) -> String {
        self.scalar_value(CallSymbol::Source)
    }

    pub fn project_page(&self) -> String {
        self.scalar_value(CallSymbol::ProjectPage)
    }

    pub fn issues_url(&self) -> String {
        self.scalar_value(CallSymbol::IssuesUrl)
    }

    pub fn puppet_version(&self) -> String {
        self.scalar_value(CallSymbol::PuppetVersion)
    }

    pub fn tags(&self) -> Vec<String> {
        self.live_call(CallSymbol::Tags)
            .map(|entry| {
                entry
                    .args
                    .iter()
                    .filter_map(|a| a.value.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dependencies(&self) -> Vec<DependencyInfo> {
        self.dependencies
            .iter()
            .map(|item| DependencyInfo {
                name: item.field(0, "name").unwrap_or_default().to_string(),
                version_requirement: item
                    .field(1, "version_requirement")
                    .unwrap_or_default()
                    .to_string(),
                line: self.item_line(item),
                resolved: item.resolved,
            })
            .collect()
    }

    pub fn os_supports(&self) -> Vec<OsSupportInfo> {
        self.os_supports
            .iter()
            .map(|item| OsSupportInfo {
                name: item.field(0, "operatingsystem").unwrap_or_default().to_string(),
                releases: item.field_list(1, "operatingsystemrelease"),
                line: self.item_line(item),
                resolved: item.resolved,
            })
            .collect()
    }

    // ---- scalar writers ----

    /// Validates the name before touching any text; an unparsable name is
    /// rejected outright. An empty name removes the construct.
    pub fn set_module_name(&mut self, name: &str) -> EditorResult<()> {
        if let Some(name) = empty_to_none(name) {
            ModuleName::parse(name)?;
        }
        self.set_scalar(CallSymbol::Name, name)
    }

    pub fn set_version(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::Version, value)
    }

    pub fn set_author(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::Author, value)
    }

    pub fn set_summary(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::Summary, value)
    }

    pub fn set_license(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::License, value)
    }

    pub fn set_source(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::Source, value)
    }

    pub fn set_project_page(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::ProjectPage, value)
    }

    pub fn set_issues_url(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::IssuesUrl, value)
    }

    pub fn set_puppet_version(&mut self, value: &str) -> EditorResult<()> {
        self.set_scalar(CallSymbol::PuppetVersion, value)
    }

    /// Replaces the whole tag list. Shared positions are rewritten in
    /// place, extra new tags appended, extra old tags removed. An empty
    /// list removes the DSL call but keeps an empty JSON array.
    pub fn set_tags(&mut self, tags: &[String]) -> EditorResult<()> {
        match self.syntax {
            SourceSyntax::Modulefile => {
                let values: Vec<Option<String>> = tags.iter().cloned().map(Some).collect();
                self.set_call_args(CallSymbol::Tags, &values)
            }
            SourceSyntax::MetadataJson => self.set_json_tags(tags),
        }
    }

    // ---- dependency writers ----

    /// Adds or updates a dependency, keyed by module name. The name must
    /// parse; nothing is written otherwise. A blank version requirement
    /// means any version.
    pub fn add_dependency(&mut self, name: &str, version_requirement: &str) -> EditorResult<()> {
        let module = ModuleName::parse(name.trim())?;
        let canonical = module.to_string();
        let requirement = trim_to_none(version_requirement).map(String::from);
        let resolved = self.resolver.resolve(&module, requirement.as_deref());
        debug!(name = %canonical, resolved, "adding dependency");

        if let Some(idx) = self.find_dependency(&module) {
            self.update_dependency(idx, &canonical, requirement.as_deref(), resolved)?;
        } else {
            match self.syntax {
                SourceSyntax::Modulefile => {
                    let mut values = vec![Some(canonical)];
                    if let Some(req) = &requirement {
                        values.push(Some(req.clone()));
                    }
                    let entry = self.create_call(CallSymbol::Dependency, &values)?;
                    self.dependencies.push(ItemEntry {
                        id: entry.id,
                        repr: ItemRepr::Call { args: entry.args },
                        resolved,
                    });
                }
                SourceSyntax::MetadataJson => {
                    let container = self.dependencies_container()?;
                    let mut fields = vec![("name".to_string(), Value::string(canonical))];
                    if let Some(req) = &requirement {
                        fields.push(("version_requirement".to_string(), Value::string(req.clone())));
                    }
                    let arg =
                        self.append_to_json_array(container, Value::Object(fields), Some(4))?;
                    self.dependencies.push(ItemEntry {
                        id: arg.id,
                        repr: ItemRepr::Object { value: arg.value },
                        resolved,
                    });
                }
            }
        }
        self.dependency_errors = self.dependencies.iter().any(|d| !d.resolved);
        Ok(())
    }

    /// Removes the dependency on `name`. Returns whether one was removed.
    pub fn remove_dependency(&mut self, name: &str) -> EditorResult<bool> {
        let module = ModuleName::parse(name.trim()).ok();
        let idx = self.dependencies.iter().position(|item| {
            let Some(raw) = item.field(0, "name") else {
                return false;
            };
            if raw == name {
                return true;
            }
            match (&module, ModuleName::parse(raw.trim()).ok()) {
                (Some(module), Some(found)) => &found == module,
                _ => false,
            }
        });
        let Some(idx) = idx else {
            return Ok(false);
        };
        let item = self.dependencies.remove(idx);
        self.remove_item_text(&item)?;
        self.dependency_errors = self.dependencies.iter().any(|d| !d.resolved);
        Ok(true)
    }

    // ---- OS support writers ----

    /// Adds or updates an OS-support entry, keyed by OS name.
    pub fn add_os_support(&mut self, name: &str, releases: &[String]) -> EditorResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::invalid_name("operating system name is empty"));
        }
        if let Some(idx) = self.find_os_support(name) {
            return self.update_os_support(idx, name, releases);
        }
        match self.syntax {
            SourceSyntax::Modulefile => {
                let mut values = vec![Some(name.to_string())];
                values.extend(releases.iter().cloned().map(Some));
                let entry = self.create_call(CallSymbol::OperatingsystemSupport, &values)?;
                self.os_supports.push(ItemEntry {
                    id: entry.id,
                    repr: ItemRepr::Call { args: entry.args },
                    resolved: true,
                });
            }
            SourceSyntax::MetadataJson => {
                let container = self.os_container()?;
                let value = Value::Object(vec![
                    ("operatingsystem".to_string(), Value::string(name)),
                    (
                        "operatingsystemrelease".to_string(),
                        Value::Array(releases.iter().map(|r| Value::string(r.as_str())).collect()),
                    ),
                ]);
                let arg = self.append_to_json_array(container, value, Some(4))?;
                self.os_supports.push(ItemEntry {
                    id: arg.id,
                    repr: ItemRepr::Object { value: arg.value },
                    resolved: true,
                });
            }
        }
        Ok(())
    }

    /// Removes the OS-support entry for `name`. Returns whether one was
    /// removed.
    pub fn remove_os_support(&mut self, name: &str) -> EditorResult<bool> {
        let name = name.trim();
        let Some(idx) = self.find_os_support(name) else {
            return Ok(false);
        };
        let item = self.os_supports.remove(idx);
        self.remove_item_text(&item)?;
        Ok(true)
    }

    // ---- entry construction from the parse stream ----

    fn add_call(&mut self, symbol: CallSymbol, span: SourceSpan, args: Vec<Arg>) {
        let id = self.document.add_position(Span::new(span.offset, span.length));
        let args: Vec<ArgEntry> = args
            .into_iter()
            .map(|arg| ArgEntry {
                id: self
                    .document
                    .add_position(Span::new(arg.span.offset, arg.span.length)),
                value: arg.value,
            })
            .collect();

        match symbol {
            CallSymbol::Dependency => self.dependencies.push(ItemEntry {
                id,
                repr: ItemRepr::Call { args },
                resolved: false,
            }),
            CallSymbol::Dependencies => {
                for arg in args {
                    self.dependencies.push(ItemEntry {
                        id: arg.id,
                        repr: ItemRepr::Object { value: arg.value },
                        resolved: false,
                    });
                }
                self.insert_call(symbol, CallEntry { id, args: Vec::new() });
            }
            CallSymbol::OperatingsystemSupport => match self.syntax {
                SourceSyntax::Modulefile => self.os_supports.push(ItemEntry {
                    id,
                    repr: ItemRepr::Call { args },
                    resolved: true,
                }),
                SourceSyntax::MetadataJson => {
                    for arg in args {
                        self.os_supports.push(ItemEntry {
                            id: arg.id,
                            repr: ItemRepr::Object { value: arg.value },
                            resolved: true,
                        });
                    }
                    self.insert_call(symbol, CallEntry { id, args: Vec::new() });
                }
            },
            _ => self.insert_call(symbol, CallEntry { id, args }),
        }
    }

    /// Last occurrence wins; a replaced duplicate's positions are dropped.
    fn insert_call(&mut self, symbol: CallSymbol, entry: CallEntry) {
        if let Some(old) = self.calls.insert(symbol, entry) {
            self.document.remove_position(old.id);
            for arg in &old.args {
                self.document.remove_position(arg.id);
            }
        }
    }

    fn resolve_dependencies(&mut self, diagnostics: &mut dyn DiagnosticSink) {
        self.dependency_errors = false;
        for idx in 0..self.dependencies.len() {
            let (name, requirement) = {
                let item = &self.dependencies[idx];
                (
                    item.field(0, "name").map(String::from),
                    item.field(1, "version_requirement").map(String::from),
                )
            };
            let resolved = name
                .as_deref()
                .and_then(|raw| ModuleName::parse(raw.trim()).ok())
                .map(|module| {
                    self.resolver
                        .resolve(&module, requirement.as_deref().and_then(trim_to_none))
                })
                .unwrap_or(false);
            self.dependencies[idx].resolved = resolved;
            if !resolved {
                self.dependency_errors = true;
                let message = unresolved_message(
                    name.as_deref().unwrap_or(""),
                    requirement.as_deref().unwrap_or(""),
                );
                let mut diagnostic = Diagnostic::error(message);
                if let Some(span) = self.document.get(self.dependencies[idx].id) {
                    diagnostic = diagnostic.at_line(self.document.line_of_offset(span.offset));
                }
                diagnostics.report(diagnostic);
            }
        }
    }

    // ---- shared mutation plumbing ----

    fn serializer(&self) -> &'static dyn ValueSerializer {
        serializer_for(self.syntax)
    }

    fn live_call(&self, symbol: CallSymbol) -> Option<&CallEntry> {
        self.calls
            .get(&symbol)
            .filter(|e| self.document.get(e.id).is_some_and(|s| !s.deleted))
    }

    fn take_live_call(&mut self, symbol: CallSymbol) -> Option<CallEntry> {
        let entry = self.calls.remove(&symbol)?;
        if self.document.get(entry.id).is_some_and(|s| !s.deleted) {
            Some(entry)
        } else {
            None
        }
    }

    fn scalar_value(&self, symbol: CallSymbol) -> String {
        self.live_call(symbol)
            .and_then(|e| e.args.first())
            .and_then(|a| a.value.as_str())
            .map(String::from)
            .unwrap_or_default()
    }

    fn item_line(&self, item: &ItemEntry) -> u32 {
        self.document
            .get(item.id)
            .map(|span| self.document.line_of_offset(span.offset))
            .unwrap_or(0)
    }

    fn set_scalar(&mut self, symbol: CallSymbol, value: &str) -> EditorResult<()> {
        let value = empty_to_none(value).map(String::from);
        self.set_call_args(symbol, &[value])
    }

    fn set_call_args(&mut self, symbol: CallSymbol, values: &[Option<String>]) -> EditorResult<()> {
        let existing = self.calls.remove(&symbol);
        if let Some(entry) = self.apply_arg_values(symbol, existing, values)? {
            self.calls.insert(symbol, entry);
        }
        Ok(())
    }

    /// The workhorse behind every call-shaped write. Creates the call when
    /// absent, removes it when all values are absent, otherwise rewrites
    /// shared argument positions in place, appends new ones and trims the
    /// leftovers together with their separators. Unchanged values touch no
    /// text at all.
    fn apply_arg_values(
        &mut self,
        symbol: CallSymbol,
        entry: Option<CallEntry>,
        values: &[Option<String>],
    ) -> EditorResult<Option<CallEntry>> {
        let has_args = values.iter().any(Option::is_some);
        let live = entry.filter(|e| self.document.get(e.id).is_some_and(|s| !s.deleted));
        let Some(mut entry) = live else {
            if !has_args {
                return Ok(None);
            }
            return self.create_call(symbol, values).map(Some);
        };

        if !has_args {
            self.remove_call_text(&entry)?;
            return Ok(None);
        }

        let mut has_changes = values.len() != entry.args.len();
        if !has_changes {
            for (idx, value) in values.iter().enumerate() {
                if entry.args[idx].value.as_str() != value.as_deref() {
                    has_changes = true;
                    break;
                }
            }
        }
        if !has_changes {
            return Ok(Some(entry));
        }

        let old_n = entry.args.len();
        let n = values.len();

        for idx in 0..n.min(old_n) {
            let value = Value::string(values[idx].clone().unwrap_or_default());
            if entry.args[idx].value == value {
                continue;
            }
            let span = self
                .document
                .get(entry.args[idx].id)
                .ok_or(EditorError::StaleEntry)?;
            let existing = self.document.slice(entry.args[idx].id).unwrap_or_default();
            let serialized = self.serializer().serialize_like(&value, existing);
            self.document.replace(span.offset, span.length, &serialized)?;
            entry.args[idx].value = value;
        }

        for idx in old_n..n {
            let span = self.document.get(entry.id).ok_or(EditorError::StaleEntry)?;
            let insert_at = last_content_end(self.document.text(), span.end());
            let mut bld = String::new();
            if idx > 0 {
                bld.push(',');
            }
            bld.push(' ');
            let payload_off = bld.len();
            let value = Value::string(values[idx].clone().unwrap_or_default());
            let serialized = self.serializer().serialize(&value);
            bld.push_str(&serialized);
            self.document.replace(insert_at, 0, &bld)?;
            let id = self
                .document
                .add_position(Span::new(insert_at + payload_off, serialized.len()));
            entry.args.push(ArgEntry { id, value });
            // Appending at the very end of the call is outside its span;
            // grow it by hand.
            let span = self.document.get(entry.id).ok_or(EditorError::StaleEntry)?;
            let new_end = insert_at + bld.len();
            if span.end() < new_end {
                self.document
                    .set_span(entry.id, span.offset, new_end - span.offset);
            }
        }

        for idx in n..old_n {
            let arg_span = self
                .document
                .get(entry.args[idx].id)
                .ok_or(EditorError::StaleEntry)?;
            let mut start = arg_span.offset;
            let mut len = arg_span.length;
            if idx > 0 {
                // Take the separator between this argument and its (possibly
                // already removed and collapsed) predecessor.
                let prev = self
                    .document
                    .get(entry.args[idx - 1].id)
                    .ok_or(EditorError::StaleEntry)?;
                let sep = arg_span.offset - prev.end();
                start -= sep;
                len += sep;
            }
            self.document.replace(start, len, "")?;
        }
        for arg in entry.args.drain(n..) {
            self.document.remove_position(arg.id);
        }

        Ok(Some(entry))
    }

    fn create_call(&mut self, symbol: CallSymbol, values: &[Option<String>]) -> EditorResult<CallEntry> {
        match self.syntax {
            SourceSyntax::Modulefile => self.create_dsl_call(symbol, values),
            SourceSyntax::MetadataJson => self.create_json_member(symbol, values),
        }
    }

    /// Appends a new DSL call on a line of its own. Dependency calls are
    /// grouped after the last existing dependency rather than at the end.
    fn create_dsl_call(&mut self, symbol: CallSymbol, values: &[Option<String>]) -> EditorResult<CallEntry> {
        let insert_pos = if symbol == CallSymbol::Dependency {
            let last = self
                .dependencies
                .iter()
                .filter(|item| matches!(item.repr, ItemRepr::Call { .. }))
                .filter_map(|item| self.document.get(item.id))
                .filter(|span| !span.deleted)
                .max_by_key(|span| span.offset);
            planner::dsl_append_pos(self.document.text(), last.map(|s| (s.offset, s.length)))
        } else {
            self.document.len()
        };

        let mut bld = String::new();
        if insert_pos > 0 && self.document.text().as_bytes()[insert_pos - 1] != b'\n' {
            bld.push('\n');
        }
        let call_off = bld.len();
        bld.push_str(symbol.key());
        bld.push(' ');
        let mut arg_layout = Vec::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                bld.push_str(", ");
            }
            let value = Value::string(value.clone().unwrap_or_default());
            let serialized = self.serializer().serialize(&value);
            arg_layout.push((bld.len(), serialized.len(), value));
            bld.push_str(&serialized);
        }
        let call_len = bld.len() - call_off;
        bld.push('\n');

        self.document.replace(insert_pos, 0, &bld)?;
        let id = self
            .document
            .add_position(Span::new(insert_pos + call_off, call_len));
        let args = arg_layout
            .into_iter()
            .map(|(off, len, value)| ArgEntry {
                id: self.document.add_position(Span::new(insert_pos + off, len)),
                value,
            })
            .collect();
        Ok(CallEntry { id, args })
    }

    /// Inserts a new member before the document's closing brace,
    /// synthesizing the top-level object when the text has none.
    fn create_json_member(&mut self, symbol: CallSymbol, values: &[Option<String>]) -> EditorResult<CallEntry> {
        let plan = planner::plan_json_insert(self.document.text(), None, Some(2));
        let mut bld = String::new();
        bld.push_str(&plan.prefix);
        bld.push_str(&self.serializer().serialize(&Value::string(symbol.key())));
        bld.push_str(": ");
        let bracketed = symbol.shape().kind == ShapeKind::ScalarList;
        if bracketed {
            bld.push('[');
        }
        let mut arg_layout = Vec::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                bld.push_str(", ");
            }
            let value = Value::string(value.clone().unwrap_or_default());
            let serialized = self.serializer().serialize(&value);
            arg_layout.push((bld.len(), serialized.len(), value));
            bld.push_str(&serialized);
        }
        if bracketed {
            bld.push(']');
        }
        let member_len = bld.len() - plan.prefix.len();
        bld.push_str(&plan.suffix);

        let base = plan.offset;
        self.document.replace(plan.offset, plan.length, &bld)?;
        let id = self
            .document
            .add_position(Span::new(plan.payload_offset(), member_len));
        let args = arg_layout
            .into_iter()
            .map(|(off, len, value)| ArgEntry {
                id: self.document.add_position(Span::new(base + off, len)),
                value,
            })
            .collect();
        Ok(CallEntry { id, args })
    }

    /// Inserts an empty `"key": [ ]` member, ready to take elements.
    fn prepare_json_array(&mut self, symbol: CallSymbol) -> EditorResult<CallEntry> {
        let plan = planner::plan_json_insert(self.document.text(), None, Some(2));
        let mut bld = String::new();
        bld.push_str(&plan.prefix);
        bld.push_str(&self.serializer().serialize(&Value::string(symbol.key())));
        bld.push_str(": [\n  ]");
        let member_len = bld.len() - plan.prefix.len();
        bld.push_str(&plan.suffix);

        self.document.replace(plan.offset, plan.length, &bld)?;
        let id = self
            .document
            .add_position(Span::new(plan.payload_offset(), member_len));
        Ok(CallEntry {
            id,
            args: Vec::new(),
        })
    }

    fn append_to_json_array(
        &mut self,
        container: PositionId,
        value: Value,
        indent: Option<usize>,
    ) -> EditorResult<ArgEntry> {
        let span = self.document.get(container).ok_or(EditorError::StaleEntry)?;
        let insert_at = planner::json_array_append_pos(self.document.text(), span.end());
        let plan = planner::plan_json_insert(self.document.text(), Some(insert_at), indent);
        let serialized = match indent {
            Some(indent) => self.serializer().serialize_indented(&value, indent),
            None => self.serializer().serialize(&value),
        };
        let mut bld = String::new();
        bld.push_str(&plan.prefix);
        bld.push_str(&serialized);
        bld.push_str(&plan.suffix);
        self.document.replace(plan.offset, plan.length, &bld)?;
        let id = self.document.add_position(Span::new(
            plan.payload_offset(),
            plan.payload_length(bld.len()),
        ));
        Ok(ArgEntry { id, value })
    }

    /// Rewrites the text behind one tracked value in place.
    fn rewrite_json_value(
        &mut self,
        id: PositionId,
        value: &Value,
        indent: Option<usize>,
    ) -> EditorResult<()> {
        let span = self.document.get(id).ok_or(EditorError::StaleEntry)?;
        let serialized = match indent {
            Some(indent) => self.serializer().serialize_indented(value, indent),
            None => self.serializer().serialize(value),
        };
        self.document.replace(span.offset, span.length, &serialized)
    }

    fn remove_call_text(&mut self, entry: &CallEntry) -> EditorResult<()> {
        let span = self.document.get(entry.id).ok_or(EditorError::StaleEntry)?;
        if !span.deleted {
            if let Some((start, len)) =
                planner::plan_removal(self.document.text(), span.offset, span.length)
            {
                self.document.replace(start, len, "")?;
            }
        }
        self.document.remove_position(entry.id);
        for arg in &entry.args {
            self.document.remove_position(arg.id);
        }
        Ok(())
    }

    fn remove_item_text(&mut self, item: &ItemEntry) -> EditorResult<()> {
        let span = self.document.get(item.id).ok_or(EditorError::StaleEntry)?;
        if !span.deleted {
            if let Some((start, len)) =
                planner::plan_removal(self.document.text(), span.offset, span.length)
            {
                self.document.replace(start, len, "")?;
            }
        }
        self.document.remove_position(item.id);
        if let ItemRepr::Call { args } = &item.repr {
            for arg in args {
                self.document.remove_position(arg.id);
            }
        }
        Ok(())
    }

    fn set_json_tags(&mut self, tags: &[String]) -> EditorResult<()> {
        let entry = match self.take_live_call(CallSymbol::Tags) {
            Some(entry) => entry,
            None => {
                if tags.is_empty() {
                    return Ok(());
                }
                let values: Vec<Option<String>> = tags.iter().cloned().map(Some).collect();
                let entry = self.create_json_member(CallSymbol::Tags, &values)?;
                self.calls.insert(CallSymbol::Tags, entry);
                return Ok(());
            }
        };
        let (entry, result) = self.apply_json_tags(entry, tags);
        self.calls.insert(CallSymbol::Tags, entry);
        result
    }

    fn apply_json_tags(&mut self, mut entry: CallEntry, tags: &[String]) -> (CallEntry, EditorResult<()>) {
        let shared = tags.len().min(entry.args.len());
        for idx in 0..shared {
            let value = Value::string(tags[idx].as_str());
            if entry.args[idx].value == value {
                continue;
            }
            if let Err(e) = self.rewrite_json_value(entry.args[idx].id, &value, None) {
                return (entry, Err(e));
            }
            entry.args[idx].value = value;
        }
        for tag in &tags[shared..] {
            match self.append_to_json_array(entry.id, Value::string(tag.as_str()), None) {
                Ok(arg) => entry.args.push(arg),
                Err(e) => return (entry, Err(e)),
            }
        }
        while entry.args.len() > tags.len() {
            let Some(arg) = entry.args.pop() else { break };
            if let Some(span) = self.document.get(arg.id) {
                if !span.deleted {
                    if let Some((start, len)) =
                        planner::plan_removal(self.document.text(), span.offset, span.length)
                    {
                        if let Err(e) = self.document.replace(start, len, "") {
                            self.document.remove_position(arg.id);
                            return (entry, Err(e));
                        }
                    }
                }
            }
            self.document.remove_position(arg.id);
        }
        (entry, Ok(()))
    }

    fn find_dependency(&self, module: &ModuleName) -> Option<usize> {
        self.dependencies.iter().position(|item| {
            item.field(0, "name")
                .and_then(|raw| ModuleName::parse(raw.trim()).ok())
                .is_some_and(|found| &found == module)
        })
    }

    fn update_dependency(
        &mut self,
        idx: usize,
        name: &str,
        requirement: Option<&str>,
        resolved: bool,
    ) -> EditorResult<()> {
        let id = self.dependencies[idx].id;
        match self.dependencies[idx].repr.clone() {
            ItemRepr::Call { args } => {
                let entry = CallEntry { id, args };
                let mut values = vec![Some(name.to_string())];
                if let Some(req) = requirement {
                    values.push(Some(req.to_string()));
                }
                match self.apply_arg_values(CallSymbol::Dependency, Some(entry), &values)? {
                    Some(entry) => {
                        let item = &mut self.dependencies[idx];
                        item.id = entry.id;
                        item.repr = ItemRepr::Call { args: entry.args };
                        item.resolved = resolved;
                    }
                    None => {
                        self.dependencies.remove(idx);
                    }
                }
            }
            ItemRepr::Object { value: old } => {
                let mut value = old.clone();
                value.set_field("name", Some(Value::string(name)));
                value.set_field("version_requirement", requirement.map(Value::string));
                if value != old {
                    self.rewrite_json_value(id, &value, Some(4))?;
                }
                let item = &mut self.dependencies[idx];
                item.repr = ItemRepr::Object { value };
                item.resolved = resolved;
            }
        }
        Ok(())
    }

    fn dependencies_container(&mut self) -> EditorResult<PositionId> {
        self.json_container(CallSymbol::Dependencies)
    }

    fn os_container(&mut self) -> EditorResult<PositionId> {
        self.json_container(CallSymbol::OperatingsystemSupport)
    }

    fn json_container(&mut self, symbol: CallSymbol) -> EditorResult<PositionId> {
        if let Some(entry) = self.live_call(symbol) {
            return Ok(entry.id);
        }
        let entry = self.prepare_json_array(symbol)?;
        let id = entry.id;
        self.calls.insert(symbol, entry);
        Ok(id)
    }

    fn find_os_support(&self, name: &str) -> Option<usize> {
        self.os_supports
            .iter()
            .position(|item| item.field(0, "operatingsystem") == Some(name))
    }

    fn update_os_support(&mut self, idx: usize, name: &str, releases: &[String]) -> EditorResult<()> {
        let id = self.os_supports[idx].id;
        match self.os_supports[idx].repr.clone() {
            ItemRepr::Call { args } => {
                let entry = CallEntry { id, args };
                let mut values = vec![Some(name.to_string())];
                values.extend(releases.iter().cloned().map(Some));
                match self.apply_arg_values(CallSymbol::OperatingsystemSupport, Some(entry), &values)? {
                    Some(entry) => {
                        let item = &mut self.os_supports[idx];
                        item.id = entry.id;
                        item.repr = ItemRepr::Call { args: entry.args };
                    }
                    None => {
                        self.os_supports.remove(idx);
                    }
                }
            }
            ItemRepr::Object { value: old } => {
                let mut value = old.clone();
                value.set_field("operatingsystem", Some(Value::string(name)));
                value.set_field(
                    "operatingsystemrelease",
                    Some(Value::Array(
                        releases.iter().map(|r| Value::string(r.as_str())).collect(),
                    )),
                );
                if value != old {
                    self.rewrite_json_value(id, &value, Some(4))?;
                }
                self.os_supports[idx].repr = ItemRepr::Object { value };
            }
        }
        Ok(())
    }
}

/// Offset just past the last non-whitespace character at or before `end`.
fn last_content_end(content: &str, end: usize) -> usize {
    let bytes = content.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let mut idx = end.min(bytes.len() - 1) as isize;
    while idx >= 0 && bytes[idx as usize].is_ascii_whitespace() {
        idx -= 1;
    }
    (idx + 1) as usize
}
