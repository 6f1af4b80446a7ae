use crate::catalog::model::{Clinica, Plan};
use crate::catalog::sort::locale_cmp;
use std::collections::HashSet;

/// Cartilla de los planes comparados: clínicas sin repetir, por nombre
#[derive(Debug, Clone, Default)]
pub struct ClinicRoster {
    clinics: Vec<Clinica>,
    regions: Vec<String>,
}

impl ClinicRoster {
    /// Deduplica por id; los datos de la primera aparición son los que quedan
    pub fn build(plans: &[&Plan]) -> Self {
        let mut seen = HashSet::new();
        let mut clinics: Vec<Clinica> = plans
            .iter()
            .flat_map(|p| p.clinicas.iter())
            .filter(|c| seen.insert(c.id.clone()))
            .cloned()
            .collect();
        clinics.sort_by(|a, b| locale_cmp(&a.entity, &b.entity));

        let mut regions: Vec<String> = clinics
            .iter()
            .flat_map(|c| c.locations.iter().map(|u| u.region.clone()))
            .filter(|r| !r.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        regions.sort_by(|a, b| locale_cmp(a, b));

        Self { clinics, regions }
    }

    pub fn clinics(&self) -> &[Clinica] {
        &self.clinics
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.clinics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clinics.is_empty()
    }

    pub fn clinics_by_region(&self, region: &str) -> Vec<&Clinica> {
        self.clinics.iter().filter(|c| c.in_region(region)).collect()
    }

    /// Barrios de una región, sin repetir
    pub fn barrios(&self, region: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .clinics
            .iter()
            .flat_map(|c| c.locations.iter())
            .filter(|u| u.region == region && !u.barrio.is_empty())
            .map(|u| u.barrio.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        out.sort_by(|a, b| locale_cmp(a, b));
        out
    }
}

/// Pertenencia sobre la lista propia del plan (sin deduplicar)
pub fn plan_includes_clinic(plan: &Plan, clinic_id: &str) -> bool {
    plan.clinicas.iter().any(|c| c.id == clinic_id)
}
