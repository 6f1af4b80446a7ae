use crate::catalog::normalize::parse_amount;
use crate::catalog::SortKey;
use std::path::PathBuf;
use std::str::FromStr;

pub const USAGE: &str = "comandos: quote <form.json> | quote recover | filter price <min> <max> | \
filter provider <a,b> | filter rating <n> | filter clinic <id,..> | filter clear | sort <criterio> | \
compare add|remove|toggle <id> | compare clear | region <nombre>|all | export [archivo.pdf] | \
history [código] | session new | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    QuoteFile {
        path: PathBuf,
    },
    QuoteRecover,
    FilterPrice {
        lo: f64,
        hi: f64,
    },
    FilterProvider(Vec<String>),
    FilterRating(f64),
    FilterClinic(Vec<String>),
    FilterClear,
    Sort(SortKey),
    CompareAdd(String),
    CompareRemove(String),
    CompareToggle(String),
    CompareClear,
    Region(Option<String>),
    Export {
        path: Option<PathBuf>,
    },
    History,
    HistoryShow(String),
    SessionNew,
    Help,
    Quit,
    // internos: los arma la App para el actor de fondo
    PersistSelection(Vec<String>),
    RenderPdf {
        html: String,
        path: Option<PathBuf>,
    },
    Unknown(String),
}

impl AppCommand {
    /// Comandos que resuelve la App sin pasar por el actor
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppCommand::FilterPrice { .. }
                | AppCommand::FilterProvider(_)
                | AppCommand::FilterRating(_)
                | AppCommand::FilterClinic(_)
                | AppCommand::FilterClear
                | AppCommand::Sort(_)
                | AppCommand::CompareAdd(_)
                | AppCommand::CompareRemove(_)
                | AppCommand::CompareToggle(_)
                | AppCommand::CompareClear
                | AppCommand::Region(_)
                | AppCommand::Export { .. }
                | AppCommand::Quit
        )
    }
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }

        match parts[0] {
            "quote" | "cotizar" => match parts.get(1).copied() {
                Some("recover") | Some("recuperar") => Ok(AppCommand::QuoteRecover),
                Some(_) => Ok(AppCommand::QuoteFile {
                    path: PathBuf::from(parts[1..].join(" ")),
                }),
                None => Ok(AppCommand::Unknown(
                    "uso: quote <form.json> | quote recover".to_string(),
                )),
            },
            "filter" | "filtro" => parse_filter(&parts[1..]),
            "sort" | "orden" => match parts.get(1) {
                Some(key) => Ok(AppCommand::Sort(SortKey::from_str(key)?)),
                None => Ok(AppCommand::Unknown(
                    "uso: sort default|price-asc|price-desc|name-asc".to_string(),
                )),
            },
            "compare" | "comparar" => {
                let id = parts.get(2).map(|s| s.to_string());
                match (parts.get(1).copied(), id) {
                    (Some("clear"), _) => Ok(AppCommand::CompareClear),
                    (Some("add"), Some(id)) => Ok(AppCommand::CompareAdd(id)),
                    (Some("remove") | Some("rm"), Some(id)) => Ok(AppCommand::CompareRemove(id)),
                    (Some("toggle"), Some(id)) => Ok(AppCommand::CompareToggle(id)),
                    _ => Ok(AppCommand::Unknown(
                        "uso: compare add|remove|toggle <id> | compare clear".to_string(),
                    )),
                }
            }
            "region" | "región" => match parts.get(1) {
                None => Ok(AppCommand::Unknown("uso: region <nombre>|all".to_string())),
                Some(r) if r.eq_ignore_ascii_case("all") || *r == "todas" => {
                    Ok(AppCommand::Region(None))
                }
                // las regiones pueden tener espacios: "GBA Norte"
                Some(_) => Ok(AppCommand::Region(Some(parts[1..].join(" ")))),
            },
            "export" | "exportar" => Ok(AppCommand::Export {
                path: parts.get(1).map(|_| PathBuf::from(parts[1..].join(" "))),
            }),
            "history" | "historial" => match parts.get(1) {
                Some(code) => Ok(AppCommand::HistoryShow(code.to_string())),
                None => Ok(AppCommand::History),
            },
            "session" | "sesion" | "sesión" => match parts.get(1).copied() {
                Some("new") | Some("nueva") => Ok(AppCommand::SessionNew),
                _ => Ok(AppCommand::Unknown("uso: session new".to_string())),
            },
            "help" | "h" | "ayuda" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" | "salir" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("comando desconocido: {}", parts[0]))),
        }
    }
}

fn parse_filter(args: &[&str]) -> Result<AppCommand, ()> {
    let list = |rest: &[&str]| -> Vec<String> {
        rest.join(" ")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    match args.first().copied() {
        Some("clear") | Some("limpiar") => Ok(AppCommand::FilterClear),
        Some("price") | Some("precio") => {
            match (
                args.get(1).and_then(|s| parse_amount(s)),
                args.get(2).and_then(|s| parse_amount(s)),
            ) {
                (Some(lo), Some(hi)) => Ok(AppCommand::FilterPrice { lo, hi }),
                _ => Ok(AppCommand::Unknown("uso: filter price <min> <max>".to_string())),
            }
        }
        Some("provider") | Some("prestador") => Ok(AppCommand::FilterProvider(list(&args[1..]))),
        Some("rating") => match args.get(1).and_then(|s| parse_amount(s)) {
            Some(n) if (0.0..=5.0).contains(&n) => Ok(AppCommand::FilterRating(n)),
            _ => Ok(AppCommand::Unknown("uso: filter rating <0-5>".to_string())),
        },
        Some("clinic") | Some("clinica") => Ok(AppCommand::FilterClinic(list(&args[1..]))),
        _ => Ok(AppCommand::Unknown(
            "uso: filter price|provider|rating|clinic ... | filter clear".to_string(),
        )),
    }
}
