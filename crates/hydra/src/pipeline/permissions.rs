use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::Role;
use super::state::Transition;

/// Named capabilities checked by UI affordances and server-side enforcement alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    VerDashboard,
    VerCandidatos,
    CrearCandidatos,
    EditarCandidatos,
    VerEstadisticas,
    EvaluarEntrevistas,
    DecidirContratacion,
    VerRechazados,
    GestionarUsuarios,
}

impl Permission {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::VerDashboard,
            Self::VerCandidatos,
            Self::CrearCandidatos,
            Self::EditarCandidatos,
            Self::VerEstadisticas,
            Self::EvaluarEntrevistas,
            Self::DecidirContratacion,
            Self::VerRechazados,
            Self::GestionarUsuarios,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VerDashboard => "ver_dashboard",
            Self::VerCandidatos => "ver_candidatos",
            Self::CrearCandidatos => "crear_candidatos",
            Self::EditarCandidatos => "editar_candidatos",
            Self::VerEstadisticas => "ver_estadisticas",
            Self::EvaluarEntrevistas => "evaluar_entrevistas",
            Self::DecidirContratacion => "decidir_contratacion",
            Self::VerRechazados => "ver_rechazados",
            Self::GestionarUsuarios => "gestionar_usuarios",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const RECLUTADOR_PERMISSIONS: &[Permission] = &[
    Permission::VerDashboard,
    Permission::VerCandidatos,
    Permission::CrearCandidatos,
    Permission::EditarCandidatos,
    Permission::VerEstadisticas,
];

// Shares only ver_candidatos and crear_candidatos with reclutador.
const SELECCION_PERMISSIONS: &[Permission] = &[
    Permission::VerCandidatos,
    Permission::CrearCandidatos,
    Permission::EvaluarEntrevistas,
    Permission::DecidirContratacion,
    Permission::VerRechazados,
    Permission::GestionarUsuarios,
];

const RECRUITING: &[Role] = &[Role::Reclutador];
const SELECTION: &[Role] = &[Role::Seleccion];
const STAFF: &[Role] = &[Role::Reclutador, Role::Seleccion];

/// Minimal roles per manual transition. Automatic transitions have no grant.
const TRANSITION_GRANTS: &[(Transition, &[Role])] = &[
    (Transition::RegistrarContacto, RECRUITING),
    (Transition::EnviarFormularios, RECRUITING),
    (Transition::Citar, STAFF),
    (Transition::ConfirmarAsistencia, STAFF),
    (Transition::MarcarNoAsistio, STAFF),
    (Transition::MarcarEntrevistado, SELECTION),
    (Transition::RegistrarEvaluacion, SELECTION),
    (Transition::AprobarFinal, SELECTION),
    (Transition::RechazarFinal, SELECTION),
    (Transition::Contratar, STAFF),
    (Transition::Descartar, STAFF),
];

/// Role → permission and transition → role tables. `Administrador` holds
/// every permission and every manual transition implicitly.
#[derive(Debug, Clone)]
pub struct PermissionModel {
    role_permissions: BTreeMap<Role, BTreeSet<Permission>>,
    transition_grants: BTreeMap<Transition, BTreeSet<Role>>,
}

impl Default for PermissionModel {
    fn default() -> Self {
        Self::standard()
    }
}

impl PermissionModel {
    pub fn standard() -> Self {
        let mut role_permissions = BTreeMap::new();
        role_permissions.insert(
            Role::Reclutador,
            RECLUTADOR_PERMISSIONS.iter().copied().collect(),
        );
        role_permissions.insert(
            Role::Seleccion,
            SELECCION_PERMISSIONS.iter().copied().collect(),
        );
        role_permissions.insert(
            Role::Administrador,
            Permission::ordered().into_iter().collect(),
        );

        let transition_grants = TRANSITION_GRANTS
            .iter()
            .map(|(transition, roles)| (*transition, roles.iter().copied().collect()))
            .collect();

        Self {
            role_permissions,
            transition_grants,
        }
    }

    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        role == Role::Administrador
            || self
                .role_permissions
                .get(&role)
                .is_some_and(|granted| granted.contains(&permission))
    }

    pub fn may_fire(&self, role: Role, transition: Transition) -> bool {
        match self.transition_grants.get(&transition) {
            Some(_) if role == Role::Administrador => true,
            Some(roles) => roles.contains(&role),
            None => false,
        }
    }

    pub fn permissions_for(&self, role: Role) -> Vec<Permission> {
        Permission::ordered()
            .into_iter()
            .filter(|permission| self.allows(role, *permission))
            .collect()
    }

    pub fn roles_for(&self, transition: Transition) -> Vec<Role> {
        Role::ordered()
            .into_iter()
            .filter(|role| self.may_fire(*role, transition))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrador_holds_every_permission() {
        let model = PermissionModel::standard();
        for permission in Permission::ordered() {
            assert!(model.allows(Role::Administrador, permission), "{permission}");
        }
    }

    #[test]
    fn reclutador_and_seleccion_share_only_listed_permissions() {
        let model = PermissionModel::standard();
        let shared: Vec<Permission> = Permission::ordered()
            .into_iter()
            .filter(|permission| {
                model.allows(Role::Reclutador, *permission)
                    && model.allows(Role::Seleccion, *permission)
            })
            .collect();

        assert_eq!(
            shared,
            vec![Permission::VerCandidatos, Permission::CrearCandidatos]
        );
    }

    #[test]
    fn final_decisions_are_selection_only() {
        let model = PermissionModel::standard();

        assert!(model.may_fire(Role::Seleccion, Transition::RechazarFinal));
        assert!(model.may_fire(Role::Administrador, Transition::AprobarFinal));
        assert!(!model.may_fire(Role::Reclutador, Transition::AprobarFinal));
        assert_eq!(
            model.roles_for(Transition::MarcarEntrevistado),
            vec![Role::Seleccion, Role::Administrador]
        );
    }

    #[test]
    fn automatic_transitions_have_no_staff_grant() {
        let model = PermissionModel::standard();
        for role in Role::ordered() {
            assert!(!model.may_fire(role, Transition::CompletarFormularios));
        }
    }

    #[test]
    fn permissions_for_lists_in_declaration_order() {
        let model = PermissionModel::standard();
        assert_eq!(
            model.permissions_for(Role::Reclutador),
            RECLUTADOR_PERMISSIONS.to_vec()
        );
    }
}
