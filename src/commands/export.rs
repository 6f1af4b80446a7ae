use crate::app_state::AppEvent;
use crate::remote::PdfRenderer;
use anyhow::Context;
use chrono::Local;
use log::{error, info};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Decide dónde se escribe el PDF.
///
/// Sin nombre se usa `comparacion-<fecha>.pdf` dentro de `out_dir`; un
/// nombre suelto también va a `out_dir`; una ruta con directorios se
/// respeta tal cual. Siempre termina en `.pdf`.
pub fn output_path(out_dir: &Path, requested: Option<PathBuf>) -> PathBuf {
    let mut path = match requested {
        None => {
            let ts = Local::now().format("%Y%m%d-%H%M%S");
            out_dir.join(format!("comparacion-{}.pdf", ts))
        }
        Some(p) if p.is_absolute() || p.components().count() > 1 => p,
        Some(p) => out_dir.join(p),
    };
    let is_pdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".pdf");
        path.set_file_name(name);
    }
    path
}

pub async fn run(
    renderer: &dyn PdfRenderer,
    html: String,
    path: PathBuf,
    evt_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let _ = evt_tx.send(AppEvent::Log("generando PDF...".to_string()));
    match write_pdf(renderer, &html, &path).await {
        Ok(size) => {
            info!("pdf written to {} ({} bytes)", path.display(), size);
            let _ = evt_tx.send(AppEvent::Message(format!(
                "✓ PDF guardado en {}",
                path.display()
            )));
        }
        Err(e) => {
            error!("pdf export failed: {:#}", e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ no se pudo exportar: {:#}", e)));
        }
    }
}

async fn write_pdf(renderer: &dyn PdfRenderer, html: &str, path: &Path) -> anyhow::Result<usize> {
    let bytes = renderer.render(html).await?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("no se pudo crear {}", dir.display()))?;
    }
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("no se pudo escribir {}", path.display()))?;
    Ok(bytes.len())
}
