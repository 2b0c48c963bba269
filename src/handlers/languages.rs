//! Languages handler: local catalogue plus what the service advertises.

use anyhow::Result;
use tracing::warn;

use crate::{language::Language, printer::TextPrinter, service::ExecutionService};

pub async fn run<S>(service: &S, printer: &TextPrinter) -> Result<()>
where
    S: ExecutionService + ?Sized,
{
    printer.print_heading("Supported languages");
    for lang in Language::ALL {
        println!("  {:<5} {:<11} ({})", lang.wire_id(), lang.display_name(), lang.syntax_id());
    }

    match service.languages().await {
        Ok(remote) => {
            println!();
            printer.print_heading("Advertised by the service");
            for l in remote {
                let image = l.image.unwrap_or_default();
                println!("  {:<5} {:<11} {}", l.id, l.name, image);
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not list service languages");
            eprintln!("Service language list unavailable: {}", e.diagnostic());
        }
    }
    Ok(())
}
