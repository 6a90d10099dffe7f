//! Keyword options of the native solve and post-process calls.
//!
//! Validation never fails: an out-of-range value is replaced by its default
//! and reported as an [`OptionWarning`] for the caller to log.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A value replaced by its default during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    pub option: &'static str,
    pub given: String,
    pub replacement: String,
}

impl fmt::Display for OptionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' does not accept '{}', using '{}'",
            self.option, self.given, self.replacement
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub warning: Option<OptionWarning>,
}

impl<T> Validated<T> {
    fn accepted(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    fn replaced(value: T, option: &'static str, given: impl fmt::Display, replacement: impl fmt::Display) -> Self {
        Self {
            value,
            warning: Some(OptionWarning {
                option,
                given: given.to_string(),
                replacement: replacement.to_string(),
            }),
        }
    }

    /// Move the warning, if any, into `warnings` and return the value.
    pub fn collect(self, warnings: &mut Vec<OptionWarning>) -> T {
        warnings.extend(self.warning);
        self.value
    }
}

/// Log each warning through `tracing`.
pub fn log_warnings(warnings: &[OptionWarning]) {
    for warning in warnings {
        warn!(option = warning.option, "{warning}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveAlgorithm {
    #[default]
    Direct,
    Iterative,
}

impl SolveAlgorithm {
    pub fn flag(self) -> char {
        match self {
            Self::Direct => 'd',
            Self::Iterative => 'i',
        }
    }
}

/// Results per load case or per load combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSelection {
    #[default]
    Case,
    Combination,
}

impl LoadSelection {
    pub fn flag(self) -> char {
        match self {
            Self::Case => 'l',
            Self::Combination => 'c',
        }
    }
}

/// Nodal stresses averaged over elements or kept per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodalStress {
    #[default]
    Averaged,
    Elementwise,
}

impl NodalStress {
    pub fn flag(self) -> char {
        match self {
            Self::Averaged => 'a',
            Self::Elementwise => 'e',
        }
    }
}

/// Files the post-processor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    MeS3d = 1,
    GeS3d = 2,
    GlLpt = 3,
    #[default]
    RsLpt = 4,
    DmS3d = 5,
    DiPva = 6,
    PsS3d = 7,
    StPva = 8,
    SgS3d = 9,
    SrPva = 10,
    RgS3d = 11,
    RsCsv = 12,
    MeS3dx = 13,
    DmS3dx = 14,
    AvgStCsv = 15,
    ElStCsv = 16,
    DiCsv = 17,
}

impl ResultCode {
    pub const ALL: [ResultCode; 17] = [
        Self::MeS3d,
        Self::GeS3d,
        Self::GlLpt,
        Self::RsLpt,
        Self::DmS3d,
        Self::DiPva,
        Self::PsS3d,
        Self::StPva,
        Self::SgS3d,
        Self::SrPva,
        Self::RgS3d,
        Self::RsCsv,
        Self::MeS3dx,
        Self::DmS3dx,
        Self::AvgStCsv,
        Self::ElStCsv,
        Self::DiCsv,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        code.checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// Suffix of the produced file, appended to the job base path.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::MeS3d => "_me.s3d",
            Self::GeS3d => "_ge.s3d",
            Self::GlLpt => "_gl.lpt",
            Self::RsLpt => "_rs.lpt",
            Self::DmS3d => "_dm.s3d",
            Self::DiPva => "_di.pva",
            Self::PsS3d => "_ps.s3d",
            Self::StPva => "_st.pva",
            Self::SgS3d => "_sg.s3d",
            Self::SrPva => "_sr.pva",
            Self::RgS3d => "_rg.s3d",
            Self::RsCsv => "_rs.csv",
            Self::MeS3dx => "_me.s3dx",
            Self::DmS3dx => "_dm.s3dx",
            Self::AvgStCsv => "_avgst.csv",
            Self::ElStCsv => "_elst.csv",
            Self::DiCsv => "_di.csv",
        }
    }
}

pub const DEFAULT_CONVERGENCE: f64 = 1.0e-6;

fn first_flag(raw: &str) -> Option<char> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?.to_ascii_lowercase();
    chars.next().is_none().then_some(first)
}

pub fn solve_algorithm(raw: &str) -> Validated<SolveAlgorithm> {
    match first_flag(raw) {
        Some('d') => Validated::accepted(SolveAlgorithm::Direct),
        Some('i') => Validated::accepted(SolveAlgorithm::Iterative),
        _ => Validated::replaced(SolveAlgorithm::Direct, "soalg", raw, 'd'),
    }
}

/// Iterative solves need a positive convergence threshold; direct solves
/// ignore it.
pub fn convergence(algorithm: SolveAlgorithm, value: f64) -> Validated<f64> {
    if algorithm == SolveAlgorithm::Iterative && !(value > 0.0) {
        Validated::replaced(DEFAULT_CONVERGENCE, "randsn", value, DEFAULT_CONVERGENCE)
    } else {
        Validated::accepted(value)
    }
}

pub fn load_selection(raw: &str) -> Validated<LoadSelection> {
    match first_flag(raw) {
        Some('l') => Validated::accepted(LoadSelection::Case),
        Some('c') => Validated::accepted(LoadSelection::Combination),
        _ => Validated::replaced(LoadSelection::Case, "lcaco", raw, 'l'),
    }
}

pub fn nodal_stress(raw: &str) -> Validated<NodalStress> {
    match first_flag(raw) {
        Some('a') => Validated::accepted(NodalStress::Averaged),
        Some('e') => Validated::accepted(NodalStress::Elementwise),
        _ => Validated::replaced(NodalStress::Averaged, "stnod", raw, 'a'),
    }
}

/// A `y`/`n` flag.
pub fn yes_no(option: &'static str, raw: &str, default: bool) -> Validated<bool> {
    match first_flag(raw) {
        Some('y') => Validated::accepted(true),
        Some('n') => Validated::accepted(false),
        _ => Validated::replaced(default, option, raw, if default { 'y' } else { 'n' }),
    }
}

/// An integer selector; anything outside `range` becomes its start.
pub fn selector(option: &'static str, value: i32, range: RangeInclusive<i32>) -> Validated<i32> {
    if range.contains(&value) {
        Validated::accepted(value)
    } else {
        let start = *range.start();
        Validated::replaced(start, option, value, start)
    }
}

pub fn result_code(code: i32) -> Validated<ResultCode> {
    match ResultCode::from_code(code) {
        Some(result) => Validated::accepted(result),
        None => {
            let fallback = ResultCode::default();
            Validated::replaced(fallback, "code", code, fallback.code())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    pub algorithm: SolveAlgorithm,
    pub convergence: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            algorithm: SolveAlgorithm::Direct,
            convergence: DEFAULT_CONVERGENCE,
        }
    }
}

impl SolveOptions {
    /// Normalize raw `soalg` / `randsn` values.
    pub fn from_raw(soalg: &str, randsn: f64) -> (Self, Vec<OptionWarning>) {
        let mut warnings = Vec::new();
        let algorithm = solve_algorithm(soalg).collect(&mut warnings);
        let convergence = convergence(algorithm, randsn).collect(&mut warnings);
        (
            Self {
                algorithm,
                convergence,
            },
            warnings,
        )
    }
}

/// Post-process options as given by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPostprocess {
    pub code: i32,
    pub lcaco: String,
    pub cstyn: String,
    pub stnod: String,
    pub csryn: String,
    pub ksres: i32,
    pub kstre: i32,
    pub kdisp: i32,
}

impl Default for RawPostprocess {
    fn default() -> Self {
        Self {
            code: ResultCode::default().code(),
            lcaco: "l".to_string(),
            cstyn: "y".to_string(),
            stnod: "a".to_string(),
            csryn: "n".to_string(),
            ksres: 1,
            kstre: 1,
            kdisp: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostprocessRequest {
    pub code: ResultCode,
    pub selection: LoadSelection,
    /// Write stress CSV files (`cstyn`)
    pub stress_csv: bool,
    pub nodal: NodalStress,
    /// Write reaction CSV files (`csryn`)
    pub reactions_csv: bool,
    /// 1 resultants, 2 stresses
    pub ksres: i32,
    pub kstre: i32,
    pub kdisp: i32,
}

impl Default for PostprocessRequest {
    fn default() -> Self {
        Self::from_raw(&RawPostprocess::default()).0
    }
}

impl PostprocessRequest {
    pub fn from_raw(raw: &RawPostprocess) -> (Self, Vec<OptionWarning>) {
        let mut w = Vec::new();
        let request = Self {
            code: result_code(raw.code).collect(&mut w),
            selection: load_selection(&raw.lcaco).collect(&mut w),
            stress_csv: yes_no("cstyn", &raw.cstyn, true).collect(&mut w),
            nodal: nodal_stress(&raw.stnod).collect(&mut w),
            reactions_csv: yes_no("csryn", &raw.csryn, false).collect(&mut w),
            ksres: selector("ksres", raw.ksres, 1..=2).collect(&mut w),
            kstre: selector("kstre", raw.kstre, 1..=8).collect(&mut w),
            kdisp: selector("kdisp", raw.kdisp, 1..=6).collect(&mut w),
        };
        (request, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_case_insensitive() {
        assert_eq!(solve_algorithm("I").value, SolveAlgorithm::Iterative);
        assert_eq!(load_selection(" c ").value, LoadSelection::Combination);
        assert!(nodal_stress("E").warning.is_none());
    }

    #[test]
    fn invalid_flags_fall_back_with_warning() {
        let v = solve_algorithm("x");
        assert_eq!(v.value, SolveAlgorithm::Direct);
        let warning = v.warning.expect("warning");
        assert_eq!(warning.option, "soalg");
        assert_eq!(warning.to_string(), "'soalg' does not accept 'x', using 'd'");

        assert_eq!(load_selection("combo").value, LoadSelection::Case);
        assert_eq!(nodal_stress("").value, NodalStress::Averaged);
        assert!(yes_no("cstyn", "maybe", true).value);
        assert!(!yes_no("csryn", "maybe", false).value);
    }

    #[test]
    fn convergence_only_matters_for_iterative() {
        assert_eq!(convergence(SolveAlgorithm::Direct, -1.0).value, -1.0);
        let v = convergence(SolveAlgorithm::Iterative, -1.0);
        assert_eq!(v.value, DEFAULT_CONVERGENCE);
        assert!(v.warning.is_some());
        assert!(convergence(SolveAlgorithm::Iterative, f64::NAN).warning.is_some());
        assert!(convergence(SolveAlgorithm::Iterative, 1e-8).warning.is_none());
    }

    #[test]
    fn selectors_use_range_start() {
        assert_eq!(selector("kstre", 8, 1..=8).value, 8);
        let v = selector("kdisp", 7, 1..=6);
        assert_eq!(v.value, 1);
        assert_eq!(v.warning.expect("warning").given, "7");
    }

    #[test]
    fn result_codes_cover_one_to_seventeen() {
        for (i, code) in ResultCode::ALL.iter().enumerate() {
            assert_eq!(code.code(), i as i32 + 1);
            assert_eq!(ResultCode::from_code(code.code()), Some(*code));
        }
        assert_eq!(ResultCode::from_code(0), None);
        assert_eq!(ResultCode::from_code(18), None);
        assert_eq!(ResultCode::from_code(-1), None);
        assert_eq!(ResultCode::from_code(i32::MIN), None);
        assert_eq!(ResultCode::from_code(i32::MAX), None);
        let v = result_code(i32::MIN);
        assert_eq!(v.value, ResultCode::RsLpt);
        assert_eq!(v.warning.expect("warning").given, i32::MIN.to_string());
        assert_eq!(ResultCode::DiCsv.suffix(), "_di.csv");
        assert_eq!(result_code(99).value, ResultCode::RsLpt);
    }

    #[test]
    fn solve_options_from_raw() {
        let (options, warnings) = SolveOptions::from_raw("q", -5.0);
        assert_eq!(options, SolveOptions::default());
        assert_eq!(warnings.len(), 1);

        let (options, warnings) = SolveOptions::from_raw("i", -5.0);
        assert_eq!(options.algorithm, SolveAlgorithm::Iterative);
        assert_eq!(options.convergence, DEFAULT_CONVERGENCE);
        assert_eq!(warnings[0].option, "randsn");
    }

    #[test]
    fn postprocess_defaults_and_replacements() {
        let (request, warnings) = PostprocessRequest::from_raw(&RawPostprocess::default());
        assert!(warnings.is_empty());
        assert_eq!(request.code, ResultCode::RsLpt);
        assert!(request.stress_csv);
        assert!(!request.reactions_csv);

        let raw = RawPostprocess {
            code: 12,
            lcaco: "z".to_string(),
            cstyn: "?".to_string(),
            ksres: 3,
            kstre: 0,
            ..RawPostprocess::default()
        };
        let (request, warnings) = PostprocessRequest::from_raw(&raw);
        assert_eq!(request.code, ResultCode::RsCsv);
        assert_eq!(request.selection, LoadSelection::Case);
        assert!(request.stress_csv);
        assert_eq!((request.ksres, request.kstre), (1, 1));
        let options: Vec<_> = warnings.iter().map(|w| w.option).collect();
        assert_eq!(options, vec!["lcaco", "cstyn", "ksres", "kstre"]);
    }
}
