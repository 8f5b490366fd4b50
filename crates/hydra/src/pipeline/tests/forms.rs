use chrono::NaiveDate;

use crate::pipeline::error::PipelineError;
use crate::pipeline::forms::{FormProgress, FormSection, FormSubmission, FORM_SECTION_COUNT};

use super::common::*;

fn field_of(err: PipelineError) -> String {
    match err {
        PipelineError::Validation { field, .. } => field,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn experiencia_requires_all_four_yes_no_answers() {
    let mut form = experiencia();
    form.primer_empleo_formal = None;

    let err = FormSubmission::Experiencia(form)
        .validate()
        .expect_err("missing answer");
    assert_eq!(field_of(err), "primer_empleo_formal");
}

#[test]
fn experiencia_rejects_end_before_start() {
    let mut form = experiencia();
    form.fecha_retiro_experiencia = NaiveDate::from_ymd_opt(2019, 1, 1);

    let err = FormSubmission::Experiencia(form)
        .validate()
        .expect_err("inverted dates");
    assert_eq!(field_of(err), "fecha_retiro_experiencia");
}

#[test]
fn experiencia_derives_tenure() {
    // 2020-02-01 .. 2023-08-15
    assert_eq!(experiencia().tiempo_laborado(), Some((3, 6)));
}

#[test]
fn consent_must_be_affirmative() {
    let err = consentimiento(false).validate().expect_err("no consent");
    assert_eq!(field_of(err), "acepta");
}

#[test]
fn consent_date_must_exist() {
    let FormSubmission::Consentimiento(mut form) = consentimiento(true) else {
        unreachable!("fixture builds consentimiento");
    };
    form.dia_consentimiento = Some(31);
    form.mes_consentimiento = Some(2);

    let err = FormSubmission::Consentimiento(form)
        .validate()
        .expect_err("31 February");
    assert_eq!(field_of(err), "fecha_consentimiento");
}

#[test]
fn invalid_section_does_not_touch_other_sections() {
    let mut progress = FormProgress::default();
    progress.record(hoja_vida());
    progress.record(estudios());

    let mut broken = experiencia();
    broken.nombre_empresa = Some("   ".to_string());
    assert!(FormSubmission::Experiencia(broken).validate().is_err());

    assert_eq!(progress.progress(), 2);
    assert!(progress.is_completed(FormSection::HojaVida));
    assert!(!progress.is_completed(FormSection::Experiencia));
}

#[test]
fn resubmission_overwrites_answers_without_changing_progress() {
    let mut progress = FormProgress::default();
    for section in all_sections() {
        progress.record(section);
    }
    assert!(progress.is_complete());

    let updated = progress.record(FormSubmission::HojaVida(crate::pipeline::forms::HojaVida {
        estado_civil: Some("Casada".to_string()),
    }));

    assert_eq!(updated, FORM_SECTION_COUNT);
    assert_eq!(
        progress
            .answers()
            .hoja_vida
            .as_ref()
            .and_then(|form| form.estado_civil.as_deref()),
        Some("Casada")
    );
}

#[test]
fn submissions_deserialize_from_tagged_json() {
    let raw = serde_json::json!({
        "section": "estudios",
        "nivel_estudios": "Profesional",
        "titulo_obtenido": "Administracion",
        "nombre_institucion": "Universidad Nacional",
        "ano_finalizacion": 2021
    });

    let submission: FormSubmission = serde_json::from_value(raw).expect("tagged payload");
    assert_eq!(submission.section(), FormSection::Estudios);
    submission.validate().expect("complete estudios");
}
