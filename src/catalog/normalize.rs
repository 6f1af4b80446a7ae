use crate::catalog::model::{Clinica, Plan, PlanAttribute, Ubicacion, DEFAULT_ATTRIBUTE_GROUP};
use log::warn;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

// Alias que usa el endpoint remoto para cada campo
const ID_KEYS: &[&str] = &["id", "_id", "plan_id"];
const NAME_KEYS: &[&str] = &["nombre", "name", "plan"];
const PROVIDER_KEYS: &[&str] = &["empresa", "provider", "company"];
const LINE_KEYS: &[&str] = &["linea", "line", "producto"];
const PRICE_KEYS: &[&str] = &["precio", "price", "valor"];
const RATING_KEYS: &[&str] = &["rating", "calificacion"];
const COPAY_KEYS: &[&str] = &["copagos", "copays"];
const ROOM_KEYS: &[&str] = &["habitacion_individual", "private_room"];
const ATTR_KEYS: &[&str] = &["atributos", "attributes"];
const CLINIC_KEYS: &[&str] = &["clinicas", "clinics"];
const BROCHURE_KEYS: &[&str] = &["folleto", "brochure_url"];
const LOGO_KEYS: &[&str] = &["logo", "logo_url"];

/// Convierte el arreglo `data.data` del cotizador en planes canónicos.
///
/// Los ítems que no son objetos se descartan. Un plan sin id recibe
/// `plan-<índice>`; si un id se repite gana la primera aparición.
pub fn normalize_plans(items: &[Value]) -> Vec<Plan> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let Some(plan) = normalize_plan(item, idx) else {
            warn!("normalize_plans: item {} is not an object, skipped", idx);
            continue;
        };
        if !seen.insert(plan.id.clone()) {
            warn!("normalize_plans: duplicate plan id {}, skipped", plan.id);
            continue;
        }
        out.push(plan);
    }
    out
}

pub fn normalize_plan(item: &Value, idx: usize) -> Option<Plan> {
    if !item.is_object() {
        return None;
    }

    let id = pick_string(item, ID_KEYS).unwrap_or_else(|| format!("plan-{}", idx));
    let name = pick_string(item, NAME_KEYS).unwrap_or_else(|| id.clone());
    let attributes = pick(item, ATTR_KEYS)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(normalize_attribute).collect())
        .unwrap_or_default();
    let clinicas = pick(item, CLINIC_KEYS)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(normalize_clinica).collect())
        .unwrap_or_default();

    Some(Plan {
        id,
        name,
        provider: pick_string(item, PROVIDER_KEYS).unwrap_or_default(),
        line: pick_string(item, LINE_KEYS).unwrap_or_default(),
        price: pick(item, PRICE_KEYS).and_then(parse_number).unwrap_or(0.0),
        rating: pick(item, RATING_KEYS)
            .and_then(parse_number)
            .unwrap_or(0.0)
            .clamp(0.0, 5.0),
        copays: pick(item, COPAY_KEYS).map(parse_flag).unwrap_or(false),
        private_room: pick(item, ROOM_KEYS).map(parse_flag).unwrap_or(false),
        attributes,
        clinicas,
        brochure_url: pick_string(item, BROCHURE_KEYS),
        logo_url: pick_string(item, LOGO_KEYS),
    })
}

fn normalize_attribute(v: &Value) -> Option<PlanAttribute> {
    let name = pick_string(v, &["nombre", "name", "atributo"])?;
    let group = pick_string(v, &["grupo", "group"])
        .unwrap_or_else(|| DEFAULT_ATTRIBUTE_GROUP.to_string());
    let value = pick(v, &["valor", "value"])
        .map(value_label)
        .unwrap_or_default();

    Some(PlanAttribute::new(group, name, value).ordered(
        pick(v, &["orden_grupo", "group_order"]).and_then(parse_order),
        pick(v, &["orden", "orden_atributo", "name_order"]).and_then(parse_order),
    ))
}

fn normalize_clinica(v: &Value) -> Option<Clinica> {
    let id = pick_string(v, &["id", "_id", "clinica_id"])?;
    let entity = pick_string(v, &["entidad", "entity", "nombre", "name"]).unwrap_or_else(|| id.clone());

    let locations = match pick(v, &["ubicaciones", "locations"]) {
        Some(Value::Array(arr)) => arr.iter().filter_map(normalize_ubicacion).collect(),
        // algunas clínicas traen región/barrio planos en la raíz
        _ => normalize_ubicacion(v).into_iter().collect(),
    };

    Some(Clinica {
        id,
        entity,
        locations,
    })
}

fn normalize_ubicacion(v: &Value) -> Option<Ubicacion> {
    let region = pick_string(v, &["region", "zona"])?;
    Some(Ubicacion {
        region,
        barrio: pick_string(v, &["barrio", "localidad"]).unwrap_or_default(),
    })
}

fn pick<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| v.get(*k))
        .find(|x| !x.is_null())
}

fn pick_string(v: &Value, keys: &[&str]) -> Option<String> {
    let s = match pick(v, keys)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn value_label(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Bool(true) => "Sí".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "si" | "sí" | "yes"
        ),
        _ => false,
    }
}

fn parse_order(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .map(|x| x.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Número de un JSON que puede venir como número o como texto
/// (`"$ 12.345,67"`, `"12345.5"`, `"4,5"`).
pub fn parse_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    static NON_NUMERIC: OnceLock<Regex> = OnceLock::new();
    let re = NON_NUMERIC.get_or_init(|| Regex::new(r"[^0-9,.\-]").expect("static regex"));
    let s = re.replace_all(raw, "");
    if s.is_empty() {
        return None;
    }

    let canonical = match (s.rfind(','), s.rfind('.')) {
        // 12.345,67: punto de miles, coma decimal
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        // 12,345.67
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        // 12.345 con grupos de tres es un separador de miles
        (None, Some(_)) if is_thousands_grouped(&s, '.') => s.replace('.', ""),
        _ => s.to_string(),
    };
    canonical.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn is_thousands_grouped(s: &str, sep: char) -> bool {
    let parts: Vec<&str> = s.trim_start_matches('-').split(sep).collect();
    parts.len() > 1
        && !parts[0].is_empty()
        && parts[0].len() <= 3
        && parts[1..].iter().all(|p| p.len() == 3)
}
