use crate::catalog::model::Plan;
use crate::compare::attributes::AttributeCatalog;
use crate::compare::clinics::{plan_includes_clinic, ClinicRoster};

/// Arma el HTML de la comparación que se manda al servicio de PDF
pub struct ComparisonRenderer<'a> {
    plans: Vec<&'a Plan>,
    region: Option<String>,
    title: String,
}

impl<'a> ComparisonRenderer<'a> {
    pub fn new(plans: Vec<&'a Plan>) -> Self {
        Self {
            plans,
            region: None,
            title: "Comparación de planes".to_string(),
        }
    }

    /// Limita la cartilla a una región
    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn render(&self) -> String {
        let catalog = AttributeCatalog::build(&self.plans);
        let roster = ClinicRoster::build(&self.plans);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html><html lang=\"es\"><head><meta charset=\"utf-8\">");
        html.push_str(&format!("<title>{}</title>", escape(&self.title)));
        html.push_str(STYLE);
        html.push_str("</head><body>");
        html.push_str(&format!("<h1>{}</h1>", escape(&self.title)));

        if self.plans.is_empty() {
            html.push_str("<p>No hay planes seleccionados.</p></body></html>");
            return html;
        }

        // encabezado: un plan por columna
        html.push_str("<table class=\"matrix\"><thead><tr><th></th>");
        for plan in &self.plans {
            html.push_str(&format!(
                "<th>{}<br><small>{}</small></th>",
                escape(&plan.provider),
                escape(&plan.name)
            ));
        }
        html.push_str("</tr></thead><tbody>");

        self.summary_row(&mut html, "Precio mensual", |p| format_price(p.price));
        self.summary_row(&mut html, "Calificación", |p| format!("{:.1} / 5", p.rating));
        self.summary_row(&mut html, "Copagos", |p| yes_no(p.copays).to_string());
        self.summary_row(&mut html, "Habitación individual", |p| {
            yes_no(p.private_room).to_string()
        });

        let mut current_group: Option<String> = None;
        for row in catalog.rows(&self.plans) {
            if current_group.as_deref() != Some(row.group.as_str()) {
                html.push_str(&format!(
                    "<tr class=\"group\"><td colspan=\"{}\">{}</td></tr>",
                    self.plans.len() + 1,
                    escape(&row.group)
                ));
                current_group = Some(row.group.clone());
            }
            html.push_str(&format!("<tr><td>{}</td>", escape(&row.name)));
            for v in &row.values {
                html.push_str(&format!("<td>{}</td>", escape(v)));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");

        let clinics = match self.region.as_deref() {
            Some(region) => roster.clinics_by_region(region),
            None => roster.clinics().iter().collect(),
        };
        if !clinics.is_empty() {
            html.push_str("<h2>Cartilla");
            if let Some(region) = &self.region {
                html.push_str(&format!(" &middot; {}", escape(region)));
            }
            html.push_str("</h2><table class=\"cartilla\"><thead><tr><th>Clínica</th><th>Ubicación</th>");
            for plan in &self.plans {
                html.push_str(&format!("<th>{}</th>", escape(&plan.provider)));
            }
            html.push_str("</tr></thead><tbody>");
            for clinic in clinics {
                let places: Vec<String> = clinic
                    .locations
                    .iter()
                    .filter(|u| self.region.as_deref().map_or(true, |r| u.region == r))
                    .map(|u| {
                        if u.barrio.is_empty() {
                            u.region.clone()
                        } else {
                            format!("{}, {}", u.barrio, u.region)
                        }
                    })
                    .collect();
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td>",
                    escape(&clinic.entity),
                    escape(&places.join(" / "))
                ));
                for plan in &self.plans {
                    let mark = if plan_includes_clinic(plan, &clinic.id) {
                        "&#10003;"
                    } else {
                        "&ndash;"
                    };
                    html.push_str(&format!("<td class=\"mark\">{}</td>", mark));
                }
                html.push_str("</tr>");
            }
            html.push_str("</tbody></table>");
        }

        html.push_str("</body></html>");
        html
    }

    fn summary_row<F>(&self, html: &mut String, label: &str, cell: F)
    where
        F: Fn(&Plan) -> String,
    {
        html.push_str(&format!("<tr class=\"summary\"><td>{}</td>", escape(label)));
        for plan in &self.plans {
            html.push_str(&format!("<td>{}</td>", escape(&cell(plan))));
        }
        html.push_str("</tr>");
    }
}

const STYLE: &str = "<style>body{font-family:sans-serif;font-size:11px}\
table{border-collapse:collapse;width:100%;margin-bottom:16px}\
td,th{border:1px solid #ccc;padding:4px;text-align:left}\
tr.group td{background:#eef;font-weight:bold}\
td.mark{text-align:center}</style>";

/// Precio en formato local: `$ 12.345`
pub fn format_price(price: f64) -> String {
    let whole = price.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    format!("$ {}", out)
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Sí"
    } else {
        "No"
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
