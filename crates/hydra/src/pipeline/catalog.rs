use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::WaveId;

/// A cliente together with the cargos it hires for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEntry {
    pub nombre: String,
    pub cargos: Vec<String>,
    /// Staff clientes hire continuously and never group candidates into oleadas.
    #[serde(default)]
    pub usa_oleadas: bool,
}

/// Intake cohort scoped to one (cliente, cargo) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    pub id: WaveId,
    pub cliente: String,
    pub cargo: String,
    pub numero: u32,
    #[serde(default)]
    pub descripcion: String,
}

impl Wave {
    pub fn matches(&self, cliente: &str, cargo: &str) -> bool {
        self.cliente == cliente && self.cargo == cargo
    }
}

/// Read-only lookup of valid (cliente, cargo) combinations and waves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub clientes: Vec<ClientEntry>,
    #[serde(default)]
    pub waves: Vec<Wave>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("inconsistent catalog: {detail}")]
    Invalid { detail: String },
}

const STAFF_CARGOS: &[&str] = &[
    "Analista Administrativa Y Contable",
    "Analista De Calidad",
    "Analista De Contratacion",
    "Analista De Reclutamiento",
    "Analista De Seleccion",
    "Auxiliar De Gestion Humana",
    "Backoffice",
    "Community Manager",
    "Contador",
    "Coordinador",
    "Datamarshall",
    "Desarrollador Web",
    "Formador",
    "GTR",
    "Psicologo De Seleccion",
    "Recepcionista",
    "Tecnico De Soporte",
    "Staff",
];

fn entry(nombre: &str, cargos: &[&str], usa_oleadas: bool) -> ClientEntry {
    ClientEntry {
        nombre: nombre.to_string(),
        cargos: cargos.iter().map(|cargo| cargo.to_string()).collect(),
        usa_oleadas,
    }
}

fn wave(id: &str, cliente: &str, cargo: &str, numero: u32, descripcion: &str) -> Wave {
    Wave {
        id: WaveId(id.to_string()),
        cliente: cliente.to_string(),
        cargo: cargo.to_string(),
        numero,
        descripcion: descripcion.to_string(),
    }
}

impl Catalog {
    /// Built-in catalog used when no catalog file is configured.
    pub fn standard() -> Self {
        Self {
            clientes: vec![
                entry("Staff Operacional", STAFF_CARGOS, false),
                entry("Staff Administrativo", STAFF_CARGOS, false),
                entry(
                    "Claro",
                    &["Agente Call Center", "Agente Call Center Plus"],
                    true,
                ),
                entry(
                    "Obamacare",
                    &["Customer Service", "Agente Call Center"],
                    true,
                ),
                entry("Majority", &["Agente Call Center"], true),
            ],
            waves: vec![
                wave("claro-acc-1", "Claro", "Agente Call Center", 1, "Enero 2025"),
                wave("claro-acc-2", "Claro", "Agente Call Center", 2, "Febrero 2025"),
                wave(
                    "claro-accp-1",
                    "Claro",
                    "Agente Call Center Plus",
                    1,
                    "Enero 2025",
                ),
                wave("obama-cs-1", "Obamacare", "Customer Service", 1, "Q1 2025"),
                wave("obama-acc-1", "Obamacare", "Agente Call Center", 1, "Q1 2025"),
                wave("majority-acc-1", "Majority", "Agente Call Center", 1, "Q1 2025"),
            ],
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_reader(reader)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut names = HashSet::new();
        for cliente in &self.clientes {
            if cliente.nombre.trim().is_empty() {
                return Err(invalid("cliente with an empty name"));
            }
            if !names.insert(cliente.nombre.as_str()) {
                return Err(invalid(format!("cliente `{}` declared twice", cliente.nombre)));
            }
            if cliente.cargos.is_empty() {
                return Err(invalid(format!("cliente `{}` has no cargos", cliente.nombre)));
            }
        }

        let mut wave_ids = HashSet::new();
        for wave in &self.waves {
            if !wave_ids.insert(&wave.id) {
                return Err(invalid(format!("wave `{}` declared twice", wave.id)));
            }
            let Some(cliente) = self.cliente(&wave.cliente) else {
                return Err(invalid(format!(
                    "wave `{}` references unknown cliente `{}`",
                    wave.id, wave.cliente
                )));
            };
            if !cliente.usa_oleadas {
                return Err(invalid(format!(
                    "wave `{}` declared for `{}`, which does not use oleadas",
                    wave.id, wave.cliente
                )));
            }
            if !cliente.cargos.iter().any(|cargo| cargo == &wave.cargo) {
                return Err(invalid(format!(
                    "wave `{}` references cargo `{}` not offered by `{}`",
                    wave.id, wave.cargo, wave.cliente
                )));
            }
        }

        Ok(())
    }

    pub fn cliente(&self, nombre: &str) -> Option<&ClientEntry> {
        self.clientes.iter().find(|entry| entry.nombre == nombre)
    }

    pub fn cargos_for(&self, cliente: &str) -> Option<&[String]> {
        self.cliente(cliente).map(|entry| entry.cargos.as_slice())
    }

    pub fn cargo_valid(&self, cliente: &str, cargo: &str) -> bool {
        self.cargos_for(cliente)
            .is_some_and(|cargos| cargos.iter().any(|known| known == cargo))
    }

    pub fn uses_waves(&self, cliente: &str) -> bool {
        self.cliente(cliente).is_some_and(|entry| entry.usa_oleadas)
    }

    pub fn wave(&self, id: &WaveId) -> Option<&Wave> {
        self.waves.iter().find(|wave| &wave.id == id)
    }

    pub fn waves_for<'a>(&'a self, cliente: &'a str, cargo: &'a str) -> impl Iterator<Item = &'a Wave> {
        self.waves
            .iter()
            .filter(move |wave| wave.matches(cliente, cargo))
    }
}

fn invalid(detail: impl Into<String>) -> CatalogError {
    CatalogError::Invalid {
        detail: detail.into(),
    }
}
