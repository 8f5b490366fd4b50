use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

pub const FORM_SECTION_COUNT: u8 = 6;

/// The six candidate-facing forms, in the order the candidate is guided through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormSection {
    HojaVida,
    DatosBasicos,
    Estudios,
    Experiencia,
    Personal,
    Consentimiento,
}

impl FormSection {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::HojaVida,
            Self::DatosBasicos,
            Self::Estudios,
            Self::Experiencia,
            Self::Personal,
            Self::Consentimiento,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HojaVida => "hoja_vida",
            Self::DatosBasicos => "datos_basicos",
            Self::Estudios => "estudios",
            Self::Experiencia => "experiencia",
            Self::Personal => "personal",
            Self::Consentimiento => "consentimiento",
        }
    }
}

impl fmt::Display for FormSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HojaVida {
    #[serde(default)]
    pub estado_civil: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatosBasicos {
    #[serde(default)]
    pub segundo_nombre: Option<String>,
    #[serde(default)]
    pub segundo_apellido: Option<String>,
    #[serde(default)]
    pub genero: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(default)]
    pub grupo_sanguineo: Option<String>,
    #[serde(default)]
    pub eps: Option<String>,
    #[serde(default)]
    pub afp: Option<String>,
    #[serde(default)]
    pub nombre_emergencia: Option<String>,
    #[serde(default)]
    pub numero_emergencia: Option<String>,
    #[serde(default)]
    pub parentesco_emergencia: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Estudios {
    #[serde(default)]
    pub nivel_estudios: Option<String>,
    #[serde(default)]
    pub titulo_obtenido: Option<String>,
    #[serde(default)]
    pub nombre_institucion: Option<String>,
    #[serde(default)]
    pub ano_finalizacion: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Experiencia {
    #[serde(default)]
    pub nombre_empresa: Option<String>,
    #[serde(default)]
    pub cargo_desempenado: Option<String>,
    #[serde(default)]
    pub salario_experiencia: Option<u64>,
    #[serde(default)]
    pub fecha_inicio_experiencia: Option<NaiveDate>,
    #[serde(default)]
    pub fecha_retiro_experiencia: Option<NaiveDate>,
    #[serde(default)]
    pub motivo_retiro: Option<String>,
    #[serde(default)]
    pub experiencia_comercial_certificada: Option<bool>,
    #[serde(default)]
    pub experiencia_comercial_no_certificada: Option<bool>,
    #[serde(default)]
    pub primer_empleo_formal: Option<bool>,
    #[serde(default)]
    pub ha_trabajado_asiste: Option<bool>,
}

impl Experiencia {
    /// Whole years and remaining months between start and end dates.
    pub fn tiempo_laborado(&self) -> Option<(u32, u32)> {
        let start = self.fecha_inicio_experiencia?;
        let end = self.fecha_retiro_experiencia?;
        if end < start {
            return None;
        }

        let mut months = (end.year() - start.year()) * 12 + end.month() as i32
            - start.month() as i32;
        if end.day() < start.day() {
            months -= 1;
        }
        let months = months.max(0) as u32;
        Some((months / 12, months % 12))
    }
}

/// Self-reported office tool proficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    Ninguno,
    Basico,
    Intermedio,
    Avanzado,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Personal {
    #[serde(default)]
    pub fortalezas: Option<String>,
    #[serde(default)]
    pub aspectos_mejorar: Option<String>,
    #[serde(default)]
    pub competencias_laborales: Option<String>,
    #[serde(default)]
    pub conocimiento_excel: Option<KnowledgeLevel>,
    #[serde(default)]
    pub conocimiento_powerpoint: Option<KnowledgeLevel>,
    #[serde(default)]
    pub conocimiento_word: Option<KnowledgeLevel>,
    #[serde(default)]
    pub autoevaluacion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Consentimiento {
    #[serde(default)]
    pub acepta: bool,
    #[serde(default)]
    pub ciudad_consentimiento: Option<String>,
    #[serde(default)]
    pub dia_consentimiento: Option<u32>,
    #[serde(default)]
    pub mes_consentimiento: Option<u32>,
    #[serde(default)]
    pub ano_consentimiento: Option<i32>,
}

/// A single section payload as submitted through the public token endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum FormSubmission {
    HojaVida(HojaVida),
    DatosBasicos(DatosBasicos),
    Estudios(Estudios),
    Experiencia(Experiencia),
    Personal(Personal),
    Consentimiento(Consentimiento),
}

impl FormSubmission {
    pub fn section(&self) -> FormSection {
        match self {
            Self::HojaVida(_) => FormSection::HojaVida,
            Self::DatosBasicos(_) => FormSection::DatosBasicos,
            Self::Estudios(_) => FormSection::Estudios,
            Self::Experiencia(_) => FormSection::Experiencia,
            Self::Personal(_) => FormSection::Personal,
            Self::Consentimiento(_) => FormSection::Consentimiento,
        }
    }

    /// Checks this section's own required-field set; other sections are not consulted.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match self {
            Self::HojaVida(form) => require_text("estado_civil", &form.estado_civil),
            Self::DatosBasicos(form) => {
                require_text("genero", &form.genero)?;
                require("fecha_nacimiento", &form.fecha_nacimiento)?;
                require_text("grupo_sanguineo", &form.grupo_sanguineo)?;
                require_text("eps", &form.eps)?;
                require_text("afp", &form.afp)?;
                require_text("nombre_emergencia", &form.nombre_emergencia)?;
                require_text("numero_emergencia", &form.numero_emergencia)?;
                require_text("parentesco_emergencia", &form.parentesco_emergencia)
            }
            Self::Estudios(form) => {
                require_text("nivel_estudios", &form.nivel_estudios)?;
                require_text("titulo_obtenido", &form.titulo_obtenido)?;
                require_text("nombre_institucion", &form.nombre_institucion)?;
                match form.ano_finalizacion {
                    None => Err(PipelineError::missing("ano_finalizacion")),
                    Some(year) if !(1900..=2100).contains(&year) => Err(
                        PipelineError::invalid("ano_finalizacion", "year out of range"),
                    ),
                    Some(_) => Ok(()),
                }
            }
            Self::Experiencia(form) => {
                require_text("nombre_empresa", &form.nombre_empresa)?;
                require_text("cargo_desempenado", &form.cargo_desempenado)?;
                require("salario_experiencia", &form.salario_experiencia)?;
                require("fecha_inicio_experiencia", &form.fecha_inicio_experiencia)?;
                require("fecha_retiro_experiencia", &form.fecha_retiro_experiencia)?;
                require_text("motivo_retiro", &form.motivo_retiro)?;
                require(
                    "experiencia_comercial_certificada",
                    &form.experiencia_comercial_certificada,
                )?;
                require(
                    "experiencia_comercial_no_certificada",
                    &form.experiencia_comercial_no_certificada,
                )?;
                require("primer_empleo_formal", &form.primer_empleo_formal)?;
                require("ha_trabajado_asiste", &form.ha_trabajado_asiste)?;
                if form.tiempo_laborado().is_none() {
                    return Err(PipelineError::invalid(
                        "fecha_retiro_experiencia",
                        "end date precedes start date",
                    ));
                }
                Ok(())
            }
            Self::Personal(form) => {
                require_text("fortalezas", &form.fortalezas)?;
                require_text("aspectos_mejorar", &form.aspectos_mejorar)?;
                require_text("competencias_laborales", &form.competencias_laborales)?;
                require("conocimiento_excel", &form.conocimiento_excel)?;
                require("conocimiento_powerpoint", &form.conocimiento_powerpoint)?;
                require("conocimiento_word", &form.conocimiento_word)?;
                require_text("autoevaluacion", &form.autoevaluacion)
            }
            Self::Consentimiento(form) => {
                if !form.acepta {
                    return Err(PipelineError::invalid(
                        "acepta",
                        "explicit consent is required",
                    ));
                }
                require_text("ciudad_consentimiento", &form.ciudad_consentimiento)?;
                let (Some(day), Some(month), Some(year)) = (
                    form.dia_consentimiento,
                    form.mes_consentimiento,
                    form.ano_consentimiento,
                ) else {
                    return Err(PipelineError::missing("fecha_consentimiento"));
                };
                if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                    return Err(PipelineError::invalid(
                        "fecha_consentimiento",
                        "not a calendar date",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn require<T>(field: &str, value: &Option<T>) -> Result<(), PipelineError> {
    match value {
        Some(_) => Ok(()),
        None => Err(PipelineError::missing(field)),
    }
}

fn require_text(field: &str, value: &Option<String>) -> Result<(), PipelineError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(PipelineError::missing(field)),
    }
}

/// Latest accepted answers per section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormAnswers {
    pub hoja_vida: Option<HojaVida>,
    pub datos_basicos: Option<DatosBasicos>,
    pub estudios: Option<Estudios>,
    pub experiencia: Option<Experiencia>,
    pub personal: Option<Personal>,
    pub consentimiento: Option<Consentimiento>,
}

/// Completion flags plus stored answers. Flags only ever get set, so the
/// derived progress count is monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormProgress {
    completed: BTreeSet<FormSection>,
    answers: FormAnswers,
}

impl FormProgress {
    pub fn progress(&self) -> u8 {
        self.completed.len() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.progress() == FORM_SECTION_COUNT
    }

    pub fn is_completed(&self, section: FormSection) -> bool {
        self.completed.contains(&section)
    }

    pub fn completed_sections(&self) -> impl Iterator<Item = FormSection> + '_ {
        self.completed.iter().copied()
    }

    pub fn answers(&self) -> &FormAnswers {
        &self.answers
    }

    /// Per-section completion projection in form order.
    pub fn flags(&self) -> Vec<(FormSection, bool)> {
        FormSection::ordered()
            .into_iter()
            .map(|section| (section, self.is_completed(section)))
            .collect()
    }

    /// Store a validated submission, overwriting any prior answers for the
    /// same section. Returns the progress after recording.
    pub fn record(&mut self, submission: FormSubmission) -> u8 {
        let section = submission.section();
        match submission {
            FormSubmission::HojaVida(form) => self.answers.hoja_vida = Some(form),
            FormSubmission::DatosBasicos(form) => self.answers.datos_basicos = Some(form),
            FormSubmission::Estudios(form) => self.answers.estudios = Some(form),
            FormSubmission::Experiencia(form) => self.answers.experiencia = Some(form),
            FormSubmission::Personal(form) => self.answers.personal = Some(form),
            FormSubmission::Consentimiento(form) => self.answers.consentimiento = Some(form),
        }
        self.completed.insert(section);
        self.progress()
    }
}
