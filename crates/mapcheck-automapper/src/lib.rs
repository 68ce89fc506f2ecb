//! Static analysis for AutoMapper configurations.
//!
//! The analyzer takes the `CreateMap` declarations found in a set of
//! compilation units, builds a member-level model of each mapping, and runs an
//! ordered catalog of rules over it:
//! - type, nullability, and collection compatibility of matched members
//! - source members nothing consumes, required destination members nothing fills
//! - nested complex members without a mapping of their own
//! - self-referencing types and mapping cycles without a depth limit
//! - custom converter contracts, null handling, and use
//! - expensive or non-deterministic work inside resolver expressions
//!
//! Most diagnostics come with one or more mechanical fixes that extend the
//! declaration's call chain.
//!
//! Analysis is best-effort: anything the engine cannot resolve (unknown types,
//! unrecognized call shapes) is skipped, never reported as an error.

pub mod descriptors;
pub mod fix;
pub mod index;
pub mod matcher;
pub mod precedence;
pub mod profile;
pub mod rules;
pub mod shape;

pub use fix::Fix;
pub use index::{Declaration, DeclarationRef, MappingIndex};
pub use rules::{Finding, Rule, RuleCatalog, RuleContext};

use fix::FixParts;
use mapcheck_config::{MapcheckConfig, RuleSeverity};
use mapcheck_core::{FileId, LineIndex};
use mapcheck_types::{
    CompilationUnit, Diagnostic, DiagnosticDescriptor, Location, MappingInvocation, Severity,
    TypeEnv,
};
use matcher::match_members;
use rayon::prelude::*;
use shape::ShapeArena;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostic {
    pub file: FileId,
    pub diagnostic: Diagnostic,
    /// The mapping declaration the diagnostic belongs to. Converter
    /// diagnostics are anchored at the converter instead.
    pub declaration: Option<DeclarationRef>,
    pub member: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisResult {
    pub diagnostics: Vec<FileDiagnostic>,
    pub declarations: Vec<Declaration>,
}

pub struct AutoMapperAnalyzer {
    config: MapcheckConfig,
    catalog: RuleCatalog,
}

impl AutoMapperAnalyzer {
    pub fn new(config: MapcheckConfig) -> Self {
        Self::with_catalog(config, RuleCatalog::default())
    }

    pub fn with_catalog(config: MapcheckConfig, catalog: RuleCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &MapcheckConfig {
        &self.config
    }

    /// Analyze every mapping declaration and converter in `units`.
    ///
    /// Diagnostics are ordered by file, then by position.
    pub fn analyze(&self, env: &dyn TypeEnv, units: &[CompilationUnit]) -> AnalysisResult {
        let declarations = collect_declarations(env, units);
        let index = MappingIndex::build(env, &declarations, self.config.analysis.flattening);

        let mut diagnostics: Vec<FileDiagnostic> = declarations
            .par_iter()
            .enumerate()
            .flat_map_iter(|(idx, declaration)| {
                self.analyze_declaration(env, &declarations, &index, idx)
                    .into_iter()
                    .filter_map(move |finding| {
                        let diagnostic = self.diagnostic(
                            finding.descriptor,
                            finding.args,
                            declaration.location,
                        )?;
                        Some(FileDiagnostic {
                            file: declaration.id.file,
                            diagnostic,
                            declaration: Some(declaration.id),
                            member: finding.member,
                        })
                    })
            })
            .collect();

        for (location, finding) in rules::check_converters(env, units, &index) {
            let Some(diagnostic) = self.diagnostic(finding.descriptor, finding.args, location)
            else {
                continue;
            };
            diagnostics.push(FileDiagnostic {
                file: location.file,
                diagnostic,
                declaration: None,
                member: finding.member,
            });
        }

        diagnostics.sort_by_key(|diagnostic| {
            (
                diagnostic.file,
                diagnostic
                    .diagnostic
                    .location
                    .map(|location| location.range.start()),
            )
        });

        tracing::debug!(
            target: "mapcheck.automapper",
            units = units.len(),
            declarations = declarations.len(),
            diagnostics = diagnostics.len(),
            "analysis finished"
        );

        AnalysisResult {
            diagnostics,
            declarations,
        }
    }

    /// Fix alternatives for one diagnostic, most preferred first. Empty when
    /// no template applies.
    pub fn fixes(
        &self,
        env: &dyn TypeEnv,
        units: &[CompilationUnit],
        diagnostic: &FileDiagnostic,
    ) -> Vec<Fix> {
        let Some(declaration) = diagnostic.declaration else {
            return Vec::new();
        };
        let declarations = collect_declarations(env, units);
        let index = MappingIndex::build(env, &declarations, self.config.analysis.flattening);
        let Some(idx) = declarations.iter().position(|d| d.id == declaration) else {
            return Vec::new();
        };
        let Some((unit, invocation)) = invocation(units, declaration) else {
            return Vec::new();
        };

        let alternatives = self
            .with_context(env, &declarations, &index, idx, |cx| {
                fix::synthesize(
                    cx,
                    diagnostic.diagnostic.name,
                    diagnostic.member.as_deref(),
                    &self.config.fixes,
                )
            })
            .unwrap_or_default();
        alternatives
            .into_iter()
            .filter_map(|parts| {
                fix::build(
                    unit,
                    invocation,
                    diagnostic.diagnostic.code,
                    parts,
                    self.config.fixes.indent_width,
                )
            })
            .collect()
    }

    /// One fix resolving every fixable diagnostic of a declaration, composed
    /// in diagnostic order with each diagnostic's preferred alternative.
    pub fn fix_all(
        &self,
        env: &dyn TypeEnv,
        units: &[CompilationUnit],
        declaration: DeclarationRef,
    ) -> Option<Fix> {
        let declarations = collect_declarations(env, units);
        let index = MappingIndex::build(env, &declarations, self.config.analysis.flattening);
        let idx = declarations.iter().position(|d| d.id == declaration)?;
        let (unit, invocation) = invocation(units, declaration)?;

        let (code, parts) = self.with_context(env, &declarations, &index, idx, |cx| {
            let mut composed: Option<(&'static str, FixParts)> = None;
            for finding in self.active_findings(cx) {
                let Some(preferred) = fix::synthesize(
                    cx,
                    finding.descriptor.name,
                    finding.member.as_deref(),
                    &self.config.fixes,
                )
                .into_iter()
                .next() else {
                    continue;
                };
                match composed.as_mut() {
                    Some((_, parts)) => parts.merge(preferred),
                    None => composed = Some((finding.descriptor.id, preferred)),
                }
            }
            composed
        })??;

        let parts = FixParts {
            title: "Fix all mapping issues".to_string(),
            ..parts
        };
        fix::build(
            unit,
            invocation,
            code,
            parts,
            self.config.fixes.indent_width,
        )
    }

    fn analyze_declaration(
        &self,
        env: &dyn TypeEnv,
        declarations: &[Declaration],
        index: &MappingIndex,
        idx: usize,
    ) -> Vec<Finding> {
        self.with_context(env, declarations, index, idx, |cx| self.active_findings(cx))
            .unwrap_or_default()
    }

    /// Findings of enabled rules, settled per member. Disabled rules drop out
    /// before precedence so they never displace what remains.
    fn active_findings(&self, cx: &RuleContext<'_>) -> Vec<Finding> {
        let findings = self
            .catalog
            .check(cx)
            .into_iter()
            .filter(|finding| self.is_enabled(finding.descriptor))
            .collect();
        precedence::resolve(findings)
    }

    fn with_context<R>(
        &self,
        env: &dyn TypeEnv,
        declarations: &[Declaration],
        index: &MappingIndex,
        idx: usize,
        f: impl FnOnce(&RuleContext<'_>) -> R,
    ) -> Option<R> {
        let declaration = declarations.get(idx)?;
        let config = &declaration.config;
        let mut arena = ShapeArena::new(env);
        let (Some(source), Some(destination)) =
            (arena.shape(config.source), arena.shape(config.destination))
        else {
            tracing::debug!(
                target: "mapcheck.automapper",
                declaration = ?declaration.id,
                "skipping declaration without type shapes"
            );
            return None;
        };
        let matches = match_members(
            &mut arena,
            &source,
            &destination,
            config,
            self.config.analysis.flattening,
        );
        let cx = RuleContext::new(
            env,
            &self.config.analysis,
            idx,
            declaration,
            source,
            destination,
            &matches,
            index,
            arena,
        );
        Some(f(&cx))
    }

    fn is_enabled(&self, descriptor: &DiagnosticDescriptor) -> bool {
        self.config
            .rule(descriptor.id)
            .map_or(true, |rule| rule.is_active())
    }

    /// The diagnostic as configured: `None` when its rule is disabled.
    fn diagnostic(
        &self,
        descriptor: &'static DiagnosticDescriptor,
        args: Vec<String>,
        location: Location,
    ) -> Option<Diagnostic> {
        let diagnostic = Diagnostic::new(descriptor, args, Some(location));
        let Some(rule) = self.config.rule(descriptor.id) else {
            return Some(diagnostic);
        };
        if !rule.is_active() {
            return None;
        }
        Some(match rule.severity {
            Some(RuleSeverity::Error) => diagnostic.with_severity(Severity::Error),
            Some(RuleSeverity::Warning) => diagnostic.with_severity(Severity::Warning),
            Some(RuleSeverity::Info) => diagnostic.with_severity(Severity::Info),
            Some(RuleSeverity::Off) | None => diagnostic,
        })
    }
}

impl Default for AutoMapperAnalyzer {
    fn default() -> Self {
        Self::new(MapcheckConfig::default())
    }
}

/// Every recognized mapping declaration, in unit then invocation order.
pub fn collect_declarations(env: &dyn TypeEnv, units: &[CompilationUnit]) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for unit in units {
        if unit.invocations.is_empty() {
            continue;
        }
        let line_index = LineIndex::new(&unit.text);
        for (idx, invocation) in unit.invocations.iter().enumerate() {
            let Some(config) = profile::parse_declaration(env, invocation) else {
                continue;
            };
            declarations.push(Declaration {
                id: DeclarationRef {
                    file: unit.file,
                    invocation: idx,
                },
                config,
                location: Location {
                    file: unit.file,
                    range: invocation.call_range,
                    line_col: line_index.line_col(invocation.call_range.start()),
                },
                receiver_type: invocation.receiver_type,
            });
        }
    }
    declarations
}

fn invocation(
    units: &[CompilationUnit],
    declaration: DeclarationRef,
) -> Option<(&CompilationUnit, &MappingInvocation)> {
    let unit = units.iter().find(|unit| unit.file == declaration.file)?;
    let invocation = unit.invocations.get(declaration.invocation)?;
    Some((unit, invocation))
}
