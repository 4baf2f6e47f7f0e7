//! Strict parse mode: text to a plain [`Metadata`] value.
//!
//! Used for final validation rather than live editing. The same front
//! ends do the walking; a strict sink populates the struct and reports
//! anything that does not fit the schema.

use crate::calls::{Arg, CallSink, CallSymbol, SourceSpan, SourceSyntax};
use crate::error::ParseResult;
use crate::metadata_json::parse_metadata_json;
use crate::modulefile::parse_modulefile;
use crate::value::Value;
use modfile_common::{DiagnosticSink, ModuleName};
use serde::{Deserialize, Serialize};

/// Plain module metadata, shaped like metadata.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<ModuleName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puppet_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencySpec>,
    #[serde(
        rename = "operatingsystem_support",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub operatingsystem_support: Vec<OsSupportSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_requirement: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsSupportSpec {
    pub operatingsystem: String,
    #[serde(
        rename = "operatingsystemrelease",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub operatingsystemrelease: Vec<String>,
}

/// Parses `source` strictly into a [`Metadata`]. Schema violations become
/// diagnostics; a hard syntax error fails the parse.
pub fn parse_metadata(
    source: &str,
    syntax: SourceSyntax,
    diagnostics: &mut dyn DiagnosticSink,
) -> ParseResult<Metadata> {
    let mut sink = StrictSink {
        syntax,
        metadata: Metadata::default(),
    };
    match syntax {
        SourceSyntax::Modulefile => parse_modulefile(source, &mut sink, diagnostics)?,
        SourceSyntax::MetadataJson => parse_metadata_json(source, &mut sink, diagnostics)?,
    }
    Ok(sink.metadata)
}

struct StrictSink {
    syntax: SourceSyntax,
    metadata: Metadata,
}

impl StrictSink {
    fn scalar(args: &[Arg]) -> Option<String> {
        args.first()
            .and_then(|a| a.value.as_str())
            .map(String::from)
    }

    /// Bad names were already reported by the front end; strict mode just
    /// leaves the field unset.
    fn set_name(&mut self, args: &[Arg]) {
        if let Some(raw) = Self::scalar(args) {
            self.metadata.name = ModuleName::parse(&raw).ok();
        }
    }

    fn add_dsl_dependency(&mut self, args: &[Arg]) {
        let Some(name) = Self::scalar(args) else {
            return;
        };
        self.metadata.dependencies.push(DependencySpec {
            name,
            version_requirement: args.get(1).and_then(|a| a.value.as_str()).map(String::from),
        });
    }

    fn add_json_dependencies(&mut self, args: &[Arg]) {
        for arg in args {
            let Some(name) = arg.value.get("name").and_then(Value::as_str) else {
                continue;
            };
            self.metadata.dependencies.push(DependencySpec {
                name: name.to_string(),
                version_requirement: arg
                    .value
                    .get("version_requirement")
                    .and_then(Value::as_str)
                    .map(String::from),
            });
        }
    }

    fn add_os_support(&mut self, args: &[Arg]) {
        match self.syntax {
            SourceSyntax::Modulefile => {
                let Some(name) = Self::scalar(args) else {
                    return;
                };
                self.metadata.operatingsystem_support.push(OsSupportSpec {
                    operatingsystem: name,
                    operatingsystemrelease: args
                        .iter()
                        .skip(1)
                        .filter_map(|a| a.value.as_str().map(String::from))
                        .collect(),
                });
            }
            SourceSyntax::MetadataJson => {
                for arg in args {
                    let Some(name) = arg.value.get("operatingsystem").and_then(Value::as_str)
                    else {
                        continue;
                    };
                    self.metadata.operatingsystem_support.push(OsSupportSpec {
                        operatingsystem: name.to_string(),
                        operatingsystemrelease: arg
                            .value
                            .get("operatingsystemrelease")
                            .map(Value::strings)
                            .unwrap_or_default(),
                    });
                }
            }
        }
    }
}

impl CallSink for StrictSink {
    fn call(&mut self, symbol: CallSymbol, _span: SourceSpan, args: Vec<Arg>) {
        match symbol {
            CallSymbol::Name => self.set_name(&args),
            CallSymbol::Version => self.metadata.version = Self::scalar(&args),
            CallSymbol::Author => self.metadata.author = Self::scalar(&args),
            CallSymbol::Summary => self.metadata.summary = Self::scalar(&args),
            CallSymbol::License => self.metadata.license = Self::scalar(&args),
            CallSymbol::Source => self.metadata.source = Self::scalar(&args),
            CallSymbol::ProjectPage => self.metadata.project_page = Self::scalar(&args),
            CallSymbol::IssuesUrl => self.metadata.issues_url = Self::scalar(&args),
            CallSymbol::PuppetVersion => self.metadata.puppet_version = Self::scalar(&args),
            CallSymbol::Tags => {
                self.metadata.tags = args
                    .iter()
                    .filter_map(|a| a.value.as_str().map(String::from))
                    .collect();
            }
            CallSymbol::Dependency => self.add_dsl_dependency(&args),
            CallSymbol::Dependencies => self.add_json_dependencies(&args),
            CallSymbol::OperatingsystemSupport => self.add_os_support(&args),
            CallSymbol::Description => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modfile_common::DiagnosticList;

    #[test]
    fn test_strict_modulefile() {
        let source = "\
name 'alice/demo'
version '1.0.0'
license 'MIT'
dependency 'puppetlabs/stdlib', '>=4.0.0'
operatingsystem_support 'RedHat', '6', '7'
tags 'web', 'proxy'
";
        let mut diags = DiagnosticList::new();
        let md = parse_metadata(source, SourceSyntax::Modulefile, &mut diags).unwrap();
        assert!(diags.is_empty());
        assert_eq!(md.name.as_ref().map(ToString::to_string).as_deref(), Some("alice/demo"));
        assert_eq!(md.version.as_deref(), Some("1.0.0"));
        assert_eq!(md.dependencies.len(), 1);
        assert_eq!(md.dependencies[0].version_requirement.as_deref(), Some(">=4.0.0"));
        assert_eq!(md.operatingsystem_support[0].operatingsystemrelease, vec!["6", "7"]);
        assert_eq!(md.tags, vec!["web", "proxy"]);
    }

    #[test]
    fn test_strict_json() {
        let source = r#"{
  "name": "alice/demo",
  "version": "1.0.0",
  "dependencies": [
    {"name": "puppetlabs/stdlib", "version_requirement": ">=4.0.0"}
  ],
  "operatingsystem_support": [
    {"operatingsystem": "RedHat", "operatingsystemrelease": ["6", "7"]}
  ]
}"#;
        let mut diags = DiagnosticList::new();
        let md = parse_metadata(source, SourceSyntax::MetadataJson, &mut diags).unwrap();
        assert_eq!(md.dependencies[0].name, "puppetlabs/stdlib");
        assert_eq!(md.operatingsystem_support[0].operatingsystem, "RedHat");
    }

    #[test]
    fn test_bad_name_reports_error_with_line() {
        let source = "version '1.0.0'\nname 'NotValid'\n";
        let mut diags = DiagnosticList::new();
        let md = parse_metadata(source, SourceSyntax::Modulefile, &mut diags).unwrap();
        assert!(md.name.is_none());
        let err = diags.errors().next().unwrap();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_metadata_serializes_like_metadata_json() {
        let md = Metadata {
            name: Some(ModuleName::parse("a/b").unwrap()),
            dependencies: vec![DependencySpec {
                name: "c/d".into(),
                version_requirement: None,
            }],
            ..Metadata::default()
        };
        let json = serde_json::to_string(&md).unwrap();
        assert_eq!(json, r#"{"name":"a/b","dependencies":[{"name":"c/d"}]}"#);
    }
}
