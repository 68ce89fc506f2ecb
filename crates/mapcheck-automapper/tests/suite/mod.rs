use mapcheck_automapper::{AnalysisResult, AutoMapperAnalyzer};
use mapcheck_config::MapcheckConfig;
use mapcheck_test_utils::Fixture;
use mapcheck_types::CompilationUnit;

mod config;
mod converters;
mod members;
mod pairs;
mod properties;
mod recursion;

pub(crate) struct Analyzed {
    pub unit: CompilationUnit,
    pub analyzer: AutoMapperAnalyzer,
    pub result: AnalysisResult,
}

pub(crate) fn analyze(fixture: &Fixture) -> Analyzed {
    analyze_with(fixture, MapcheckConfig::default())
}

pub(crate) fn analyze_with(fixture: &Fixture, config: MapcheckConfig) -> Analyzed {
    let unit = fixture.unit();
    let analyzer = AutoMapperAnalyzer::new(config);
    let result = analyzer.analyze(&fixture.store, std::slice::from_ref(&unit));
    Analyzed {
        unit,
        analyzer,
        result,
    }
}

impl Analyzed {
    /// `(name, member)` for every diagnostic, in report order.
    pub fn names(&self) -> Vec<(&'static str, Option<&str>)> {
        self.result
            .diagnostics
            .iter()
            .map(|d| (d.diagnostic.name, d.member.as_deref()))
            .collect()
    }

    /// One rendered diagnostic per line.
    pub fn render(&self) -> String {
        self.result
            .diagnostics
            .iter()
            .map(|d| d.diagnostic.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn fixes(&self, fixture: &Fixture, idx: usize) -> Vec<mapcheck_automapper::Fix> {
        self.analyzer.fixes(
            &fixture.store,
            std::slice::from_ref(&self.unit),
            &self.result.diagnostics[idx],
        )
    }
}
