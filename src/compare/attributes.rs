use crate::catalog::model::{Plan, DEFAULT_ATTRIBUTE_GROUP};
use std::collections::HashMap;

/// Valor de celda cuando el plan no tiene el atributo
pub const NOT_APPLICABLE: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroup {
    pub name: String,
    pub attributes: Vec<String>,
}

/// Catálogo de atributos de los planes comparados: grupo -> nombres
/// distintos, en orden estable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeCatalog {
    pub groups: Vec<AttributeGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub group: String,
    pub name: String,
    pub values: Vec<String>,
}

struct Slot {
    first_seen: usize,
    order: Option<i32>,
}

impl Slot {
    // el primer orden explícito que aparece es el que vale
    fn observe(&mut self, order: Option<i32>) {
        if self.order.is_none() {
            self.order = order;
        }
    }
}

impl AttributeCatalog {
    /// Agrupa y deduplica por (grupo, nombre). Los órdenes explícitos van
    /// primero, de menor a mayor; lo demás queda en orden de aparición.
    pub fn build(plans: &[&Plan]) -> Self {
        let mut group_slots: HashMap<&str, Slot> = HashMap::new();
        let mut name_slots: HashMap<(&str, &str), Slot> = HashMap::new();

        for plan in plans {
            for attr in &plan.attributes {
                let next_group = group_slots.len();
                group_slots
                    .entry(attr.group.as_str())
                    .or_insert(Slot {
                        first_seen: next_group,
                        order: None,
                    })
                    .observe(attr.group_order);

                let next_name = name_slots.len();
                name_slots
                    .entry((attr.group.as_str(), attr.name.as_str()))
                    .or_insert(Slot {
                        first_seen: next_name,
                        order: None,
                    })
                    .observe(attr.name_order);
            }
        }

        let mut group_names: Vec<(&str, &Slot)> =
            group_slots.iter().map(|(k, v)| (*k, v)).collect();
        group_names.sort_by_key(|(_, slot)| order_key(slot));

        let groups = group_names
            .into_iter()
            .map(|(group, _)| {
                let mut names: Vec<(&str, &Slot)> = name_slots
                    .iter()
                    .filter(|((g, _), _)| *g == group)
                    .map(|((_, n), slot)| (*n, slot))
                    .collect();
                names.sort_by_key(|(_, slot)| order_key(slot));
                AttributeGroup {
                    name: group.to_string(),
                    attributes: names.into_iter().map(|(n, _)| n.to_string()).collect(),
                }
            })
            .collect();

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, name: &str) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn attribute_count(&self) -> usize {
        self.groups.iter().map(|g| g.attributes.len()).sum()
    }

    /// Filas de la matriz de comparación, una columna por plan
    pub fn rows(&self, plans: &[&Plan]) -> Vec<MatrixRow> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.attributes.iter().map(move |name| MatrixRow {
                    group: g.name.clone(),
                    name: name.clone(),
                    values: plans
                        .iter()
                        .map(|p| value_for(p, &g.name, name).to_string())
                        .collect(),
                })
            })
            .collect()
    }
}

fn order_key(slot: &Slot) -> (bool, i32, usize) {
    (slot.order.is_none(), slot.order.unwrap_or(0), slot.first_seen)
}

/// Valor de un atributo para un plan. Busca dentro del grupo; si no está,
/// acepta el mismo nombre cargado sin grupo. Si tampoco, `NOT_APPLICABLE`.
pub fn value_for<'a>(plan: &'a Plan, group: &str, name: &str) -> &'a str {
    plan.attributes
        .iter()
        .find(|a| a.group == group && a.name == name)
        .or_else(|| {
            plan.attributes
                .iter()
                .find(|a| a.group == DEFAULT_ATTRIBUTE_GROUP && a.name == name)
        })
        .map(|a| a.value.as_str())
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_APPLICABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::PlanAttribute;

    fn plans() -> Vec<Plan> {
        vec![
            Plan::new("A", "OSDE", 1000.0, 4.5)
                .with_attribute(PlanAttribute::new("Internación", "Habitación", "Individual"))
                .with_attribute(PlanAttribute::new("Ambulatorio", "Consultas", "Ilimitadas"))
                .with_attribute(PlanAttribute::new("", "Óptica", "Sí")),
            Plan::new("B", "Galeno", 5000.0, 3.0)
                .with_attribute(PlanAttribute::new("Ambulatorio", "Consultas", "Con copago"))
                .with_attribute(PlanAttribute::new("Ambulatorio", "Kinesiología", "25 sesiones"))
                .with_attribute(PlanAttribute::new("Internación", "Consultas", "Sin cargo")),
        ]
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let plans = plans();
        let refs: Vec<&Plan> = plans.iter().collect();
        let catalog = AttributeCatalog::build(&refs);
        let names: Vec<&str> = catalog.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Internación", "Ambulatorio", DEFAULT_ATTRIBUTE_GROUP]);
        assert_eq!(
            catalog.group("Ambulatorio").unwrap().attributes,
            vec!["Consultas", "Kinesiología"]
        );
    }

    #[test]
    fn same_name_in_different_groups_is_distinct() {
        let plans = plans();
        let refs: Vec<&Plan> = plans.iter().collect();
        let catalog = AttributeCatalog::build(&refs);
        assert_eq!(
            catalog.group("Internación").unwrap().attributes,
            vec!["Habitación", "Consultas"]
        );
        assert_eq!(catalog.attribute_count(), 5);
    }

    #[test]
    fn explicit_order_wins_over_first_seen() {
        let a = Plan::new("A", "OSDE", 1.0, 1.0)
            .with_attribute(PlanAttribute::new("Extras", "Gimnasio", "Sí"))
            .with_attribute(PlanAttribute::new("Cobertura", "Cirugía", "100%").ordered(Some(1), Some(2)))
            .with_attribute(PlanAttribute::new("Cobertura", "PMO", "Sí").ordered(Some(1), Some(1)));
        let b = Plan::new("B", "Galeno", 1.0, 1.0)
            .with_attribute(PlanAttribute::new("Cobertura", "Traslados", "Sí"));
        let catalog = AttributeCatalog::build(&[&a, &b]);
        let names: Vec<&str> = catalog.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Cobertura", "Extras"]);
        assert_eq!(
            catalog.group("Cobertura").unwrap().attributes,
            vec!["PMO", "Cirugía", "Traslados"]
        );
    }

    #[test]
    fn build_is_deterministic() {
        let plans = plans();
        let refs: Vec<&Plan> = plans.iter().collect();
        let first = AttributeCatalog::build(&refs);
        for _ in 0..10 {
            assert_eq!(AttributeCatalog::build(&refs), first);
        }
    }

    #[test]
    fn missing_cells_use_the_sentinel() {
        let plans = plans();
        let refs: Vec<&Plan> = plans.iter().collect();
        let catalog = AttributeCatalog::build(&refs);
        let rows = catalog.rows(&refs);
        let kine = rows.iter().find(|r| r.name == "Kinesiología").unwrap();
        assert_eq!(kine.values, vec![NOT_APPLICABLE, "25 sesiones"]);
        let internacion = rows
            .iter()
            .find(|r| r.group == "Internación" && r.name == "Consultas")
            .unwrap();
        // A tiene "Consultas" sólo en Ambulatorio: no se mezcla con Internación
        assert_eq!(internacion.values, vec![NOT_APPLICABLE, "Sin cargo"]);
    }

    #[test]
    fn ungrouped_attribute_fills_a_grouped_row() {
        let a = Plan::new("A", "OSDE", 1.0, 1.0)
            .with_attribute(PlanAttribute::new("Odontología", "Ortodoncia", "50%"));
        let b = Plan::new("B", "Galeno", 1.0, 1.0)
            .with_attribute(PlanAttribute::new("", "Ortodoncia", "Sin cobertura"))
            .with_attribute(PlanAttribute::new("Extras", "Ortodoncia", "No usar"));
        assert_eq!(value_for(&b, "Odontología", "Ortodoncia"), "Sin cobertura");
        assert_eq!(value_for(&a, "Extras", "Ortodoncia"), NOT_APPLICABLE);
    }

    #[test]
    fn empty_selection_gives_empty_catalog() {
        let catalog = AttributeCatalog::build(&[]);
        assert!(catalog.is_empty());
        assert!(catalog.rows(&[]).is_empty());
    }
}
