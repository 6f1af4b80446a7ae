use serde::{Deserialize, Serialize};

/// Grupo para los atributos que llegan sin grupo
pub const DEFAULT_ATTRIBUTE_GROUP: &str = "Otros Beneficios";

/// Un plan de salud (prepaga) ya normalizado.
///
/// Todos los componentes internos trabajan sobre esta forma canónica; las
/// variantes de nombres del endpoint remoto se resuelven en `normalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub line: String,
    pub price: f64,
    pub rating: f64,
    pub copays: bool,
    pub private_room: bool,
    pub attributes: Vec<PlanAttribute>,
    pub clinicas: Vec<Clinica>,
    pub brochure_url: Option<String>,
    pub logo_url: Option<String>,
}

impl Plan {
    /// Plan mínimo, útil para armar repositorios a mano
    pub fn new(id: impl Into<String>, provider: impl Into<String>, price: f64, rating: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider: provider.into(),
            line: String::new(),
            price,
            rating,
            copays: false,
            private_room: false,
            attributes: Vec::new(),
            clinicas: Vec::new(),
            brochure_url: None,
            logo_url: None,
        }
    }

    pub fn with_attribute(mut self, attr: PlanAttribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_clinica(mut self, clinica: Clinica) -> Self {
        self.clinicas.push(clinica);
        self
    }

    pub fn clinic_ids(&self) -> impl Iterator<Item = &str> {
        self.clinicas.iter().map(|c| c.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAttribute {
    pub group: String,
    pub name: String,
    pub value: String,
    pub group_order: Option<i32>,
    pub name_order: Option<i32>,
}

impl PlanAttribute {
    pub fn new(group: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        let group = group.into();
        let group = if group.trim().is_empty() {
            DEFAULT_ATTRIBUTE_GROUP.to_string()
        } else {
            group
        };
        Self {
            group,
            name: name.into(),
            value: value.into(),
            group_order: None,
            name_order: None,
        }
    }

    pub fn ordered(mut self, group_order: Option<i32>, name_order: Option<i32>) -> Self {
        self.group_order = group_order;
        self.name_order = name_order;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clinica {
    pub id: String,
    pub entity: String,
    pub locations: Vec<Ubicacion>,
}

impl Clinica {
    pub fn new(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity: entity.into(),
            locations: Vec::new(),
        }
    }

    pub fn at(mut self, region: impl Into<String>, barrio: impl Into<String>) -> Self {
        self.locations.push(Ubicacion {
            region: region.into(),
            barrio: barrio.into(),
        });
        self
    }

    pub fn in_region(&self, region: &str) -> bool {
        self.locations.iter().any(|u| u.region == region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ubicacion {
    pub region: String,
    pub barrio: String,
}

/// Composición del grupo familiar a cotizar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrupoFamiliar {
    Individual,
    Pareja,
    Familia,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacto {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Formulario de cotización tal como se envía al endpoint remoto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub group: GrupoFamiliar,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_age: Option<u32>,
    #[serde(default)]
    pub children: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    pub contact: Contacto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl QuoteRequest {
    /// Chequeos mínimos antes de pegarle al endpoint
    pub fn validate(&self) -> Result<(), String> {
        if self.age == 0 || self.age > 120 {
            return Err(format!("edad inválida: {}", self.age));
        }
        match self.group {
            GrupoFamiliar::Individual => {
                if self.partner_age.is_some() || !self.children.is_empty() {
                    return Err("un plan individual no lleva pareja ni hijos".to_string());
                }
            }
            GrupoFamiliar::Pareja => {
                if self.partner_age.is_none() {
                    return Err("falta la edad de la pareja".to_string());
                }
            }
            GrupoFamiliar::Familia => {
                if self.children.is_empty() {
                    return Err("un grupo familiar necesita al menos un hijo".to_string());
                }
            }
        }
        if self.contact.email.trim().is_empty() && self.contact.phone.trim().is_empty() {
            return Err("se necesita email o teléfono de contacto".to_string());
        }
        Ok(())
    }
}
