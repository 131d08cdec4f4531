use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::GradboardError;

/// Categorical attributes a record can be filtered or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Attribute {
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "region")]
    Region,
    #[serde(rename = "degree")]
    Degree,
    #[serde(rename = "institution")]
    Institution,
    #[serde(rename = "nationality")]
    NationalityType,
    #[serde(rename = "legal-status")]
    LegalStatus,
    #[serde(rename = "dependency")]
    AdministrativeDependency,
    #[serde(rename = "grade")]
    ProgramGrade,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Year,
        Attribute::Region,
        Attribute::Degree,
        Attribute::Institution,
        Attribute::NationalityType,
        Attribute::LegalStatus,
        Attribute::AdministrativeDependency,
        Attribute::ProgramGrade,
    ];

    pub const NAMES: [&'static str; 8] = [
        "year",
        "region",
        "degree",
        "institution",
        "nationality",
        "legal-status",
        "dependency",
        "grade",
    ];

    /// The stacked-bar dimensions shown on the dashboard, in page order.
    pub const DASHBOARD_DIMENSIONS: [Attribute; 5] = [
        Attribute::Region,
        Attribute::AdministrativeDependency,
        Attribute::LegalStatus,
        Attribute::ProgramGrade,
        Attribute::NationalityType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Year => "year",
            Attribute::Region => "region",
            Attribute::Degree => "degree",
            Attribute::Institution => "institution",
            Attribute::NationalityType => "nationality",
            Attribute::LegalStatus => "legal-status",
            Attribute::AdministrativeDependency => "dependency",
            Attribute::ProgramGrade => "grade",
        }
    }

    /// Source column holding this attribute.
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Year => "AN_BASE",
            Attribute::Region => "NM_REGIAO",
            Attribute::Degree => "DS_GRAU_ACADEMICO_DISCENTE",
            Attribute::Institution => "NM_ENTIDADE_ENSINO",
            Attribute::NationalityType => "DS_TIPO_NACIONALIDADE_DISCENTE",
            Attribute::LegalStatus => "CS_STATUS_JURIDICO",
            Attribute::AdministrativeDependency => "DS_DEPENDENCIA_ADMINISTRATIVA",
            Attribute::ProgramGrade => "CD_CONCEITO_PROGRAMA",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Year => "Year",
            Attribute::Region => "Region",
            Attribute::Degree => "Academic degree",
            Attribute::Institution => "Institution",
            Attribute::NationalityType => "Nationality type",
            Attribute::LegalStatus => "Legal status",
            Attribute::AdministrativeDependency => "Administrative dependency",
            Attribute::ProgramGrade => "Program CAPES grade",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = GradboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name().eq_ignore_ascii_case(wanted) || attr.column() == wanted)
            .ok_or_else(|| GradboardError::UnknownAttribute(s.to_string()))
    }
}

/// Numeric attributes summarised as per-year distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "months")]
    MonthsToCompletion,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Age, Metric::MonthsToCompletion];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Age => "age",
            Metric::MonthsToCompletion => "months",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Metric::Age => "IDADE_APROX_DISCENTE",
            Metric::MonthsToCompletion => "QT_MES_TITULACAO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Age => "Approximate age",
            Metric::MonthsToCompletion => "Months to completion",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = GradboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name().eq_ignore_ascii_case(wanted) || metric.column() == wanted)
            .ok_or_else(|| GradboardError::UnknownMetric(s.to_string()))
    }
}

/// One completion entry. The raw row is kept so exports reproduce every source column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Record {
    #[serde(rename = "AN_BASE")]
    pub year: i32,
    #[serde(rename = "NM_REGIAO")]
    pub region: String,
    #[serde(rename = "DS_GRAU_ACADEMICO_DISCENTE")]
    pub degree: String,
    #[serde(rename = "NM_ENTIDADE_ENSINO")]
    pub institution: String,
    #[serde(rename = "IDADE_APROX_DISCENTE")]
    pub age: Option<f64>,
    #[serde(rename = "QT_MES_TITULACAO")]
    pub months_to_completion: Option<f64>,
    #[serde(rename = "DS_TIPO_NACIONALIDADE_DISCENTE")]
    pub nationality_type: String,
    #[serde(rename = "CS_STATUS_JURIDICO")]
    pub legal_status: String,
    #[serde(rename = "DS_DEPENDENCIA_ADMINISTRATIVA")]
    pub administrative_dependency: String,
    #[serde(rename = "CD_CONCEITO_PROGRAMA")]
    pub program_grade: String,
    #[serde(skip)]
    pub(crate) raw: StringRecord,
}

impl Record {
    pub fn value(&self, attribute: Attribute) -> Cow<'_, str> {
        match attribute {
            Attribute::Year => Cow::Owned(self.year.to_string()),
            Attribute::Region => Cow::Borrowed(&self.region),
            Attribute::Degree => Cow::Borrowed(&self.degree),
            Attribute::Institution => Cow::Borrowed(&self.institution),
            Attribute::NationalityType => Cow::Borrowed(&self.nationality_type),
            Attribute::LegalStatus => Cow::Borrowed(&self.legal_status),
            Attribute::AdministrativeDependency => Cow::Borrowed(&self.administrative_dependency),
            Attribute::ProgramGrade => Cow::Borrowed(&self.program_grade),
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Age => self.age,
            Metric::MonthsToCompletion => self.months_to_completion,
        }
        .filter(|v| v.is_finite())
    }

    pub fn raw(&self) -> &StringRecord {
        &self.raw
    }
}

/// Columns that must be present for a file to be loaded.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    Attribute::ALL
        .into_iter()
        .map(Attribute::column)
        .chain(Metric::ALL.into_iter().map(Metric::column))
}
