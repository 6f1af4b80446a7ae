use crate::catalog::model::Plan;

/// Máximo de planes que se pueden comparar a la vez
pub const MAX_COMPARE: usize = 4;

/// Selección de planes a comparar, en orden de inserción.
///
/// El tope de `MAX_COMPARE` se respeta acá, sin depender de que la UI
/// deshabilite nada. Los métodos devuelven `true` si el conjunto cambió,
/// que es cuando hay que persistir.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSet {
    ids: Vec<String>,
}

impl ComparisonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruye desde lo persistido, aplicando las mismas reglas que `add`
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for id in ids {
            set.add(id);
        }
        set
    }

    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.is_full() || self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|x| x != id);
        self.ids.len() != before
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id)
        } else {
            self.add(id)
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_COMPARE
    }

    /// Quita los ids que ya no existen en el repositorio actual
    pub fn retain_known(&mut self, plans: &[Plan]) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| plans.iter().any(|p| &p.id == id));
        self.ids.len() != before
    }

    /// Planes seleccionados, en el orden de la selección
    pub fn selected<'a>(&self, plans: &'a [Plan]) -> Vec<&'a Plan> {
        self.ids
            .iter()
            .filter_map(|id| plans.iter().find(|p| &p.id == id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_add_is_rejected() {
        let mut set = ComparisonSet::new();
        for id in ["A", "B", "C", "D"] {
            assert!(set.add(id));
        }
        assert!(!set.add("E"));
        assert_eq!(set.ids(), ["A", "B", "C", "D"]);
    }

    #[test]
    fn never_grows_past_the_cap() {
        let mut set = ComparisonSet::new();
        for i in 0..50 {
            set.add(format!("P{}", i));
            assert!(set.len() <= MAX_COMPARE);
        }
    }

    #[test]
    fn duplicate_add_and_absent_remove_are_noops() {
        let mut set = ComparisonSet::from_ids(["A", "B"]);
        let snapshot = set.clone();
        assert!(!set.add("A"));
        assert_eq!(set, snapshot);
        assert!(!set.remove("Z"));
        assert_eq!(set, snapshot);
    }

    #[test]
    fn toggle_and_clear() {
        let mut set = ComparisonSet::new();
        assert!(set.toggle("A"));
        assert!(set.contains("A"));
        assert!(set.toggle("A"));
        assert!(set.is_empty());
        set.add("B");
        assert!(set.clear());
        assert!(!set.clear());
    }

    #[test]
    fn from_ids_applies_cap_and_dedup() {
        let set = ComparisonSet::from_ids(["A", "A", "B", "C", "D", "E"]);
        assert_eq!(set.ids(), ["A", "B", "C", "D"]);
    }

    #[test]
    fn selection_follows_insertion_order() {
        let plans = vec![
            Plan::new("A", "OSDE", 1.0, 1.0),
            Plan::new("B", "Galeno", 1.0, 1.0),
            Plan::new("C", "Omint", 1.0, 1.0),
        ];
        let mut set = ComparisonSet::from_ids(["C", "X", "A"]);
        let ids: Vec<&str> = set.selected(&plans).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A"]);
        assert!(set.retain_known(&plans));
        assert_eq!(set.ids(), ["C", "A"]);
    }
}
