use crate::catalog::model::Plan;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Default => "default",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::NameAsc => "name-asc",
        }
    }

    /// Siguiente criterio, para alternar con una tecla
    pub fn next(self) -> Self {
        match self {
            SortKey::Default => SortKey::PriceAsc,
            SortKey::PriceAsc => SortKey::PriceDesc,
            SortKey::PriceDesc => SortKey::NameAsc,
            SortKey::NameAsc => SortKey::Default,
        }
    }
}

impl FromStr for SortKey {
    type Err = ();

    /// Los criterios desconocidos caen en `Default`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "price-asc" | "precio-asc" => SortKey::PriceAsc,
            "price-desc" | "precio-desc" => SortKey::PriceDesc,
            "name-asc" | "nombre-asc" => SortKey::NameAsc,
            _ => SortKey::Default,
        })
    }
}

/// Devuelve una nueva secuencia ordenada. `sort_by` es estable, así que
/// los empates mantienen el orden del repositorio.
pub fn sort_plans<'a>(plans: &[&'a Plan], key: SortKey) -> Vec<&'a Plan> {
    let mut out = plans.to_vec();
    match key {
        SortKey::Default => {}
        SortKey::PriceAsc => out.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => out.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::NameAsc => out.sort_by(|a, b| locale_cmp(&a.provider, &b.provider)),
    }
    out
}

/// Comparación de texto para castellano: primero sin mayúsculas ni
/// tildes (la ñ va después de la n), las tildes sólo desempatan.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn collation_key(s: &str) -> (Vec<u32>, Vec<u8>) {
    let mut primary = Vec::with_capacity(s.len());
    let mut secondary = Vec::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        let (base, accent) = match c {
            'á' | 'à' | 'ä' | 'â' => ('a', 1),
            'é' | 'è' | 'ë' | 'ê' => ('e', 1),
            'í' | 'ì' | 'ï' | 'î' => ('i', 1),
            'ó' | 'ò' | 'ö' | 'ô' => ('o', 1),
            'ú' | 'ù' | 'ü' | 'û' => ('u', 1),
            'ç' => ('c', 1),
            other => (other, 0),
        };
        primary.push(if base == 'ñ' {
            'n' as u32 * 2 + 1
        } else {
            base as u32 * 2
        });
        secondary.push(accent);
    }
    (primary, secondary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Vec<Plan> {
        vec![
            Plan::new("A", "OSDE", 1000.0, 4.5),
            Plan::new("B", "Galeno", 5000.0, 3.0),
            Plan::new("C", "avalian", 3000.0, 4.0),
            Plan::new("D", "Ñuke Salud", 2500.0, 4.0),
            Plan::new("E", "Nobis", 2500.0, 4.0),
        ]
    }

    fn ids(plans: &[&Plan]) -> Vec<String> {
        plans.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn price_desc_on_two_plans() {
        let plans = repo();
        let refs: Vec<&Plan> = plans[..2].iter().collect();
        assert_eq!(ids(&sort_plans(&refs, SortKey::PriceDesc)), vec!["B", "A"]);
    }

    #[test]
    fn ties_keep_repository_order() {
        let plans = repo();
        let refs: Vec<&Plan> = plans.iter().collect();
        assert_eq!(
            ids(&sort_plans(&refs, SortKey::PriceAsc)),
            vec!["A", "D", "E", "C", "B"]
        );
    }

    #[test]
    fn asc_and_desc_are_reverses_without_ties() {
        let plans = repo();
        let refs: Vec<&Plan> = plans[..4].iter().collect();
        let mut asc = ids(&sort_plans(&refs, SortKey::PriceAsc));
        let desc = ids(&sort_plans(&refs, SortKey::PriceDesc));
        asc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn default_preserves_order() {
        let plans = repo();
        let refs: Vec<&Plan> = plans.iter().collect();
        assert_eq!(ids(&sort_plans(&refs, SortKey::Default)), ids(&refs));
    }

    #[test]
    fn name_sort_is_case_and_accent_insensitive() {
        let plans = repo();
        let refs: Vec<&Plan> = plans.iter().collect();
        assert_eq!(
            ids(&sort_plans(&refs, SortKey::NameAsc)),
            vec!["C", "B", "E", "D", "A"]
        );
        assert_eq!(locale_cmp("Clínica", "clinica"), Ordering::Greater);
        assert_eq!(locale_cmp("Clínica", "Clinicas"), Ordering::Less);
    }

    #[test]
    fn unknown_key_is_default() {
        assert_eq!("price-desc".parse::<SortKey>(), Ok(SortKey::PriceDesc));
        assert_eq!("cualquiera".parse::<SortKey>(), Ok(SortKey::Default));
        assert_eq!(SortKey::NameAsc.next(), SortKey::Default);
    }
}
