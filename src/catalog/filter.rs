use crate::catalog::model::Plan;
use std::collections::BTreeSet;

/// Estado de los filtros de la grilla de resultados.
///
/// Un conjunto vacío de prestadores o de clínicas significa "sin
/// restricción". Todas las facetas se combinan con AND.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub price_range: (f64, f64),
    pub providers: BTreeSet<String>,
    pub min_rating: f64,
    pub clinics: BTreeSet<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            price_range: (0.0, f64::MAX),
            providers: BTreeSet::new(),
            min_rating: 0.0,
            clinics: BTreeSet::new(),
        }
    }
}

impl FilterState {
    /// Estado inicial para un repositorio: rango de precios observado
    pub fn for_plans(plans: &[Plan]) -> Self {
        let mut state = Self::default();
        state.reset(price_bounds(plans));
        state
    }

    /// "Limpiar filtros": vuelve al rango min/max observado
    pub fn reset(&mut self, bounds: (f64, f64)) {
        self.price_range = bounds;
        self.providers.clear();
        self.min_rating = 0.0;
        self.clinics.clear();
    }

    pub fn set_price_range(&mut self, lo: f64, hi: f64) {
        self.price_range = if lo <= hi { (lo, hi) } else { (hi, lo) };
    }

    /// true si el estado no descarta ningún plan de `plans`
    pub fn is_noop(&self, plans: &[Plan]) -> bool {
        let (lo, hi) = price_bounds(plans);
        self.providers.is_empty()
            && self.clinics.is_empty()
            && self.min_rating <= 0.0
            && self.price_range.0 <= lo
            && self.price_range.1 >= hi
    }

    pub fn matches(&self, plan: &Plan) -> bool {
        let (lo, hi) = self.price_range;
        if plan.price < lo || plan.price > hi {
            return false;
        }
        if !self.providers.is_empty() && !self.providers.contains(&plan.provider) {
            return false;
        }
        if plan.rating < self.min_rating {
            return false;
        }
        if !self.clinics.is_empty() && !plan.clinic_ids().any(|id| self.clinics.contains(id)) {
            return false;
        }
        true
    }
}

/// Aplica todas las facetas. Conserva el orden de entrada.
pub fn apply_filters<'a>(plans: &'a [Plan], state: &FilterState) -> Vec<&'a Plan> {
    plans.iter().filter(|p| state.matches(p)).collect()
}

/// (mínimo, máximo) de precio; `(0, 0)` si no hay planes
pub fn price_bounds(plans: &[Plan]) -> (f64, f64) {
    let mut iter = plans.iter().map(|p| p.price);
    let Some(first) = iter.next() else {
        return (0.0, 0.0);
    };
    iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)))
}

/// Prestadores distintos, ordenados, para armar la faceta
pub fn providers(plans: &[Plan]) -> Vec<String> {
    plans
        .iter()
        .map(|p| p.provider.clone())
        .filter(|p| !p.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
