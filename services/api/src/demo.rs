use crate::infra::{load_catalog, seed_bootstrap_admin, LogNotifier, BOOTSTRAP_ADMIN};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use hydra::error::AppError;
use hydra::pipeline::{
    CandidateRecord, Catalog, Consentimiento, DatosBasicos, DecisionRequest, Estudios,
    EvaluationRequest, Experiencia, FormSubmission, HojaVida, InMemoryPipelineRepository,
    KnowledgeLevel, NewCandidate, NewStaffUser, Personal, PipelineError, PipelinePolicy,
    PipelineSummary, RecruitmentPipeline, Role, StaffId, StaffIdentity,
};
use std::path::PathBuf;
use std::sync::Arc;

type DemoPipeline = RecruitmentPipeline<InMemoryPipelineRepository, LogNotifier>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional catalog JSON replacing the built-in cliente/cargo/oleada tables.
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Stop after the forms are completed, skipping interview and decision.
    #[arg(long)]
    pub(crate) skip_decision: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Catalog JSON file to validate
    #[arg(long)]
    pub(crate) path: PathBuf,
}

pub(crate) fn run_catalog_check(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = load_catalog(Some(args.path.as_path()))?;
    println!("Catalog {} is valid", args.path.display());
    render_catalog(&catalog);
    Ok(())
}

fn render_catalog(catalog: &Catalog) {
    for cliente in &catalog.clientes {
        let oleadas = if cliente.usa_oleadas { "oleadas" } else { "sin oleadas" };
        println!("- {} ({})", cliente.nombre, oleadas);
        for cargo in &cliente.cargos {
            let waves: Vec<String> = catalog
                .waves_for(&cliente.nombre, cargo)
                .map(|wave| wave.id.to_string())
                .collect();
            if waves.is_empty() {
                println!("    {cargo}");
            } else {
                println!("    {cargo}: {}", waves.join(", "));
            }
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let repository = Arc::new(InMemoryPipelineRepository::new());
    let notifier = Arc::new(LogNotifier::default());
    let pipeline = RecruitmentPipeline::new(
        Arc::new(PipelinePolicy::with_catalog(catalog)),
        repository.clone(),
        notifier.clone(),
    );

    if let Err(err) = seed_bootstrap_admin(repository.as_ref()) {
        println!("Staff directory unavailable: {}", err);
        return Ok(());
    }
    let admin = StaffIdentity::new(BOOTSTRAP_ADMIN, Role::Administrador);
    let recruiter = StaffIdentity::new("rec-demo", Role::Reclutador);
    let selector = StaffIdentity::new("sel-demo", Role::Seleccion);
    for (identity, nombre) in [(&recruiter, "Reclutador Demo"), (&selector, "Seleccion Demo")] {
        let request = NewStaffUser {
            id: identity.user_id.clone(),
            nombre_completo: nombre.to_string(),
            email: format!("{}@example.com", identity.user_id),
            role: identity.role,
        };
        if let Err(err) = pipeline.create_staff(&admin, request) {
            println!("Staff setup failed: {}", err);
            return Ok(());
        }
    }

    println!("Recruitment pipeline demo");

    println!("\nCandidate intake");
    let record = match pipeline.create_candidate(&recruiter, demo_candidate()) {
        Ok(record) => record,
        Err(err) => {
            println!("  Candidate rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "  Created {} ({}) for {} / {}",
        record.candidate.id,
        record.candidate.contact.full_name(),
        record.candidate.process.cliente,
        record.candidate.process.cargo
    );
    println!("  Access token valid until {}", record.token.expires_at);

    match pipeline.send_form_invitation(&recruiter, &record.candidate.id) {
        Ok(outcome) => {
            println!("  Invitation sent, estado {}", outcome.record.candidate.estado);
            if let Some(warning) = outcome.warning {
                println!("  Delivery warning: {}", warning);
            }
        }
        Err(err) => println!("  Invitation failed: {}", err),
    }

    println!("\nCandidate forms (submitted out of order)");
    for section in demo_sections() {
        let label = section.section();
        match pipeline.submit_form(&record.token.value, section) {
            Ok(updated) => println!(
                "  - {}: progreso {}/6, estado {}",
                label,
                updated.candidate.progreso_formularios(),
                updated.candidate.estado
            ),
            Err(err) => println!("  - {}: rejected ({})", label, err),
        }
    }

    if !args.skip_decision {
        walk_interview(&pipeline, &recruiter, &selector, &record);
    }

    match pipeline.summary(&recruiter) {
        Ok(summary) => render_summary(&summary),
        Err(err) => println!("\nStatistics unavailable: {}", err),
    }

    let sent = notifier.sent();
    println!("\nInvitations queued: {}", sent.len());
    Ok(())
}

fn walk_interview(
    pipeline: &DemoPipeline,
    recruiter: &StaffIdentity,
    selector: &StaffIdentity,
    record: &CandidateRecord,
) {
    let id = &record.candidate.id;
    let interview_day = Local::now().date_naive() + Duration::days(2);
    let Some(fecha) = interview_day.and_hms_opt(9, 0, 0) else {
        return;
    };

    println!("\nInterview");
    let steps: [(&str, &dyn Fn() -> Result<CandidateRecord, PipelineError>); 3] = [
        ("Scheduled", &|| pipeline.schedule_interview(recruiter, id, fecha)),
        ("Attendance confirmed", &|| pipeline.confirm_attendance(recruiter, id)),
        ("Interviewed", &|| pipeline.mark_interviewed(selector, id)),
    ];
    for (label, step) in steps {
        match step() {
            Ok(updated) => println!("  {}: estado {}", label, updated.candidate.estado),
            Err(err) => {
                println!("  {} failed: {}", label, err);
                return;
            }
        }
    }

    let scores = EvaluationRequest::from_scores([15.0, 14.0, 16.0, 13.0, 15.0]);
    match pipeline.record_evaluation(selector, id, scores) {
        Ok(updated) => {
            if let Some(evaluation) = &updated.candidate.evaluation {
                println!(
                    "  Evaluation: total {:.1}, aprobado {}",
                    evaluation.total, evaluation.aprobado
                );
            }
        }
        Err(err) => {
            println!("  Evaluation failed: {}", err);
            return;
        }
    }

    println!("\nFinal decision");
    let unjustified = DecisionRequest {
        aprobado: false,
        justificacion: None,
    };
    if let Err(err) = pipeline.record_decision(selector, id, unjustified) {
        println!("  Rejection without justificacion refused: {}", err);
    }
    match pipeline.record_decision(
        selector,
        id,
        DecisionRequest::reject("insufficient domain knowledge"),
    ) {
        Ok(updated) => println!("  Decision recorded: estado {}", updated.candidate.estado),
        Err(err) => println!("  Decision failed: {}", err),
    }

    if let Ok(updated) = pipeline.get_candidate(selector, id) {
        println!("  Audit trail:");
        for change in &updated.candidate.history {
            let actor = change
                .actor
                .as_ref()
                .map(StaffId::to_string)
                .unwrap_or_else(|| "pipeline".to_string());
            println!(
                "    - {} {} -> {} by {}",
                change.transition, change.from, change.to, actor
            );
        }
    }
}

fn render_summary(summary: &PipelineSummary) {
    println!("\nPipeline statistics ({} candidates)", summary.total);
    for entry in summary.por_estado.iter().filter(|entry| entry.count > 0) {
        println!("- {}: {}", entry.estado, entry.count);
    }
    if let Some(average) = summary.promedio_evaluacion {
        println!("Average evaluation: {:.1}", average);
    }
}

fn demo_candidate() -> NewCandidate {
    NewCandidate {
        nacionalidad: "Colombiana".to_string(),
        tipo_documento: Some("CC".to_string()),
        numero_documento: Some("1032456789".to_string()),
        primer_nombre: "Valentina".to_string(),
        primer_apellido: "Ospina".to_string(),
        email_personal: Some("valentina.ospina@example.com".to_string()),
        numero_celular: "3204567890".to_string(),
        ciudad: "Bogota".to_string(),
        cliente: "Claro".to_string(),
        cargo: "Agente Call Center".to_string(),
        fuente_reclutamiento: "Computrabajo".to_string(),
        ..NewCandidate::default()
    }
}

fn demo_sections() -> Vec<FormSubmission> {
    let today = Local::now().date_naive();
    vec![
        FormSubmission::Personal(Personal {
            fortalezas: Some("Comunicacion asertiva".to_string()),
            aspectos_mejorar: Some("Hablar en publico".to_string()),
            competencias_laborales: Some("Venta consultiva".to_string()),
            conocimiento_excel: Some(KnowledgeLevel::Intermedio),
            conocimiento_powerpoint: Some(KnowledgeLevel::Basico),
            conocimiento_word: Some(KnowledgeLevel::Avanzado),
            autoevaluacion: Some("Constante y organizada".to_string()),
        }),
        FormSubmission::HojaVida(HojaVida {
            estado_civil: Some("Soltera".to_string()),
        }),
        FormSubmission::Experiencia(Experiencia {
            nombre_empresa: Some("Teleperformance".to_string()),
            cargo_desempenado: Some("Asesora de ventas".to_string()),
            salario_experiencia: Some(1_450_000),
            fecha_inicio_experiencia: NaiveDate::from_ymd_opt(2021, 3, 1),
            fecha_retiro_experiencia: NaiveDate::from_ymd_opt(2024, 6, 30),
            motivo_retiro: Some("Cierre de campana".to_string()),
            experiencia_comercial_certificada: Some(true),
            experiencia_comercial_no_certificada: Some(false),
            primer_empleo_formal: Some(false),
            ha_trabajado_asiste: Some(false),
        }),
        FormSubmission::DatosBasicos(DatosBasicos {
            genero: Some("Femenino".to_string()),
            fecha_nacimiento: NaiveDate::from_ymd_opt(1999, 9, 9),
            grupo_sanguineo: Some("O+".to_string()),
            eps: Some("Compensar".to_string()),
            afp: Some("Colfondos".to_string()),
            nombre_emergencia: Some("Jorge Ospina".to_string()),
            numero_emergencia: Some("3118765432".to_string()),
            parentesco_emergencia: Some("Padre".to_string()),
            ..DatosBasicos::default()
        }),
        FormSubmission::Estudios(Estudios {
            nivel_estudios: Some("Tecnologo".to_string()),
            titulo_obtenido: Some("Tecnologa en gestion comercial".to_string()),
            nombre_institucion: Some("SENA".to_string()),
            ano_finalizacion: Some(2020),
        }),
        FormSubmission::Consentimiento(Consentimiento {
            acepta: true,
            ciudad_consentimiento: Some("Bogota".to_string()),
            dia_consentimiento: Some(today.day()),
            mes_consentimiento: Some(today.month()),
            ano_consentimiento: Some(today.year()),
        }),
    ]
}
