use std::sync::Arc;

use anyhow::Result;

use crate::{
    language::Language,
    printer::TextPrinter,
    service::ExecutionService,
    session::{Availability, SessionController},
};

pub async fn run<S>(service: Arc<S>, url: &str, printer: &TextPrinter) -> Result<bool>
where
    S: ExecutionService + ?Sized,
{
    let controller = SessionController::new(service, Language::default());
    let availability = controller.check_availability().await;
    printer.print_availability(url, availability);
    Ok(availability == Availability::Available)
}
