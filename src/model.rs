//! Domain types for cleaned service requests.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The four maintenance domains kept by the pipeline.
///
/// Variants are declared in label order so that the derived `Ord` sorts
/// tabs alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ServiceGroup {
    #[serde(rename = "ARBORIZACAO")]
    Arborizacao,
    #[serde(rename = "DRENAGEM")]
    Drenagem,
    #[serde(rename = "ILUMINACAO PUBLICA")]
    IluminacaoPublica,
    #[serde(rename = "LIMPEZA URBANA")]
    LimpezaUrbana,
}

impl ServiceGroup {
    pub const ALL: [ServiceGroup; 4] = [
        ServiceGroup::Arborizacao,
        ServiceGroup::Drenagem,
        ServiceGroup::IluminacaoPublica,
        ServiceGroup::LimpezaUrbana,
    ];

    /// Returns `None` for groups outside the four domains of interest.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ARBORIZACAO" => Some(ServiceGroup::Arborizacao),
            "DRENAGEM" => Some(ServiceGroup::Drenagem),
            "ILUMINACAO PUBLICA" => Some(ServiceGroup::IluminacaoPublica),
            "LIMPEZA URBANA" => Some(ServiceGroup::LimpezaUrbana),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceGroup::Arborizacao => "ARBORIZACAO",
            ServiceGroup::Drenagem => "DRENAGEM",
            ServiceGroup::IluminacaoPublica => "ILUMINACAO PUBLICA",
            ServiceGroup::LimpezaUrbana => "LIMPEZA URBANA",
        }
    }
}

impl fmt::Display for ServiceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse geographic grouping of the city's administrative regions (RPA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Zone {
    Centro,
    Norte,
    Oeste,
    Sul,
    #[serde(rename = "Não Informado")]
    NaoInformado,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Centro,
        Zone::Norte,
        Zone::Oeste,
        Zone::Sul,
        Zone::NaoInformado,
    ];

    /// Maps a canonical region code to its zone.
    ///
    /// | Code    | Zone          |
    /// |---------|---------------|
    /// | 1       | Centro        |
    /// | 2, 3    | Norte         |
    /// | 4       | Oeste         |
    /// | 5, 6    | Sul           |
    /// | other   | Não Informado |
    pub fn from_region_code(code: &str) -> Self {
        match code {
            "1" => Zone::Centro,
            "2" | "3" => Zone::Norte,
            "4" => Zone::Oeste,
            "5" | "6" => Zone::Sul,
            _ => Zone::NaoInformado,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::Centro => "Centro",
            Zone::Norte => "Norte",
            Zone::Oeste => "Oeste",
            Zone::Sul => "Sul",
            Zone::NaoInformado => "Não Informado",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Zone {
    type Err = String;

    /// Case-insensitive; accepts "Nao Informado" without the tilde.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "nao informado" {
            return Ok(Zone::NaoInformado);
        }
        Zone::ALL
            .into_iter()
            .find(|z| z.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown zone `{s}`"))
    }
}

/// Lifecycle state of a ticket, declared in display rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Cadastrada,
    Preparacao,
    Execucao,
    Pendencia,
    Atendida,
    Fiscalizacao,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Cadastrada,
        Status::Preparacao,
        Status::Execucao,
        Status::Pendencia,
        Status::Atendida,
        Status::Fiscalizacao,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Status::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Raw value as it appears in the `SITUACAO` column.
    pub fn code(self) -> &'static str {
        match self {
            Status::Cadastrada => "CADASTRADA",
            Status::Preparacao => "PREPARACAO",
            Status::Execucao => "EXECUCAO",
            Status::Pendencia => "PENDENCIA",
            Status::Atendida => "ATENDIDA",
            Status::Fiscalizacao => "FISCALIZACAO",
        }
    }

    /// Display rank, 1 through 6.
    pub fn order(self) -> u8 {
        match self {
            Status::Cadastrada => 1,
            Status::Preparacao => 2,
            Status::Execucao => 3,
            Status::Pendencia => 4,
            Status::Atendida => 5,
            Status::Fiscalizacao => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Cadastrada => "Cadastrada",
            Status::Preparacao => "Preparação",
            Status::Execucao => "Execução",
            Status::Pendencia => "Pendencia",
            Status::Atendida => "Atendida",
            Status::Fiscalizacao => "Fiscalização",
        }
    }

    /// Chart colour used for this status.
    pub fn color(self) -> &'static str {
        match self {
            Status::Cadastrada => "#808080",
            Status::Preparacao => "#4682b4",
            Status::Execucao => "#ffa500",
            Status::Pendencia => "#ff4040",
            Status::Atendida => "#32cd32",
            Status::Fiscalizacao => "#9370db",
        }
    }

    /// ATENDIDA and FISCALIZACAO count as resolved.
    pub fn is_resolved(self) -> bool {
        matches!(self, Status::Atendida | Status::Fiscalizacao)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::from_code(&s.trim().to_uppercase())
            .ok_or_else(|| format!("unknown status `{s}`"))
    }
}

/// One cleaned ticket. Built once by the pipeline and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRequest {
    pub service_group: ServiceGroup,
    pub service_name: String,
    pub neighborhood: String,
    pub region_code: String,
    pub zone: Zone,
    pub request_date: NaiveDate,
    /// Empty in the source means no status change was recorded.
    pub last_status_date: Option<NaiveDate>,
    /// `last_status_date - request_date`; negative values are kept as-is.
    pub duration_days: Option<i64>,
    pub month: u32,
    pub day: u32,
    pub year: i32,
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: u32,
    pub status: Status,
    pub status_order: u8,
}

/// The pipeline output: records sorted by status rank.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ServiceRequest>,
}

impl Dataset {
    pub(crate) fn new(records: Vec<ServiceRequest>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ServiceRequest] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceRequest> {
        self.records.iter()
    }

    /// Distinct service groups present, in label order.
    pub fn service_groups(&self) -> Vec<ServiceGroup> {
        ServiceGroup::ALL
            .into_iter()
            .filter(|g| self.records.iter().any(|r| r.service_group == *g))
            .collect()
    }

    pub fn zones(&self) -> Vec<Zone> {
        Zone::ALL
            .into_iter()
            .filter(|z| self.records.iter().any(|r| r.zone == *z))
            .collect()
    }

    pub fn months(&self) -> Vec<u32> {
        (1..=12)
            .filter(|m| self.records.iter().any(|r| r.month == *m))
            .collect()
    }

    pub fn statuses(&self) -> Vec<Status> {
        Status::ALL
            .into_iter()
            .filter(|s| self.records.iter().any(|r| r.status == *s))
            .collect()
    }
}
